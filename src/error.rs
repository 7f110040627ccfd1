use thiserror::Error;

/// Errors reported by [`BiMap`](crate::BiMap) lookups.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// The requested key is not present on the queried side.
    #[error("bimap: out of range")]
    OutOfRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Error::OutOfRange.to_string(), "bimap: out of range");
    }
}
