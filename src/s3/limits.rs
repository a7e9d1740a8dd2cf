//! S3 multipart limits
//! <https://docs.aws.amazon.com/AmazonS3/latest/userguide/qfacts.html>

/// 5 GiB, every part but the last must fit
pub const MAX_PART_SIZE_BYTES: u64 = 5_368_709_120;

/// Part numbers are kept as `u16`
pub const MAX_PARTS_PER_UPLOAD: usize = 10_000;

/// 5 MiB, only the last part may be smaller. Also the smallest chunk the
/// middleware buffers per upload.
pub const MIN_PART_SIZE_BYTES: usize = 5_242_880;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits() {
        const _: () = assert!(MAX_PART_SIZE_BYTES > MIN_PART_SIZE_BYTES as u64);
        assert!(u16::try_from(MAX_PARTS_PER_UPLOAD).is_ok());
        assert_eq!(MIN_PART_SIZE_BYTES, 5 * 1024 * 1024);
        assert_eq!(MAX_PART_SIZE_BYTES, 5 * 1024 * 1024 * 1024);
    }
}
