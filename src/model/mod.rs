use thiserror::Error;

pub mod component;
pub mod descriptor;
pub mod pattern;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Mapping clause `{0}` is missing a `->` separator")]
    InvalidMappingClause(String),
    #[error("Empty pattern in mapping declaration `{0}`")]
    EmptyPattern(String),
    #[error("Missing notation component `{0}` in string `{1}`")]
    MissingNotationComponent(String, String),
}
