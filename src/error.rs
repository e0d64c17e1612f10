pub type SlidereelResult<T> = Result<T, SlidereelError>;

#[derive(thiserror::Error, Debug)]
pub enum SlidereelError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("probe error: {0}")]
    Probe(String),

    #[error("process error: {0}")]
    Process(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SlidereelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    pub fn process(msg: impl Into<String>) -> Self {
        Self::Process(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            SlidereelError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            SlidereelError::probe("x")
                .to_string()
                .contains("probe error:")
        );
        assert!(
            SlidereelError::process("x")
                .to_string()
                .contains("process error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = SlidereelError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
