use crate::error::Result;
use crate::tdl::DownloadRequest;

pub const DOWNLOAD_SUBCOMMAND: &str = "dl";
pub const URL_FLAG: &str = "-u";
pub const THREADS_FLAG: &str = "--threads";
pub const CHUNK_SIZE_FLAG: &str = "--size";
pub const POOL_FLAG: &str = "--pool";
pub const OUTPUT_DIR_FLAG: &str = "-d";
pub const CONTINUE_FLAG: &str = "--continue";
pub const INCLUDE_FLAG: &str = "--include";
pub const EXCLUDE_FLAG: &str = "--exclude";
pub const MIN_SIZE_FLAG: &str = "--min-size";
pub const MAX_SIZE_FLAG: &str = "--max-size";

/// Maps a request onto the argument vector for `tdl dl`.
///
/// The fixed part always comes first in the same order (subcommand, link,
/// threads, chunk size, pool, output directory); optional flags follow.
pub fn build_download_args(request: &DownloadRequest) -> Result<Vec<String>> {
    request.validate()?;
    let url = request.locator.resolve()?;

    let mut args = vec![
        DOWNLOAD_SUBCOMMAND.to_string(),
        URL_FLAG.to_string(),
        url,
        THREADS_FLAG.to_string(),
        request.threads.to_string(),
        CHUNK_SIZE_FLAG.to_string(),
        request.chunk_size.to_string(),
    ];

    if request.threads > 1 {
        if let Some(pool) = request.pool_size {
            args.push(POOL_FLAG.to_string());
            args.push(pool.to_string());
        }
    }

    args.push(OUTPUT_DIR_FLAG.to_string());
    args.push(request.output_dir.to_string_lossy().into_owned());

    if request.resume {
        args.push(CONTINUE_FLAG.to_string());
    }
    if !request.include.is_empty() {
        args.push(INCLUDE_FLAG.to_string());
        args.push(request.include.join(","));
    }
    if !request.exclude.is_empty() {
        args.push(EXCLUDE_FLAG.to_string());
        args.push(request.exclude.join(","));
    }
    if let Some(min) = request.min_size {
        args.push(MIN_SIZE_FLAG.to_string());
        args.push(min.to_string());
    }
    if let Some(max) = request.max_size {
        args.push(MAX_SIZE_FLAG.to_string());
        args.push(max.to_string());
    }

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::locator::Locator;
    use std::path::PathBuf;

    fn request() -> DownloadRequest {
        DownloadRequest {
            locator: Locator::message("1234567890", "100"),
            threads: 16,
            chunk_size: 1_048_576,
            pool_size: Some(8),
            output_dir: PathBuf::from("downloads"),
            include: Vec::new(),
            exclude: Vec::new(),
            min_size: None,
            max_size: None,
            resume: false,
        }
    }

    #[test]
    fn fixed_flags_in_order() {
        let args = build_download_args(&request()).unwrap();
        assert_eq!(
            args,
            [
                "dl",
                "-u",
                "https://t.me/c/1234567890/100",
                "--threads",
                "16",
                "--size",
                "1048576",
                "--pool",
                "8",
                "-d",
                "downloads",
            ]
        );
    }

    #[test]
    fn single_thread_drops_pool() {
        let args = build_download_args(&DownloadRequest {
            threads: 1,
            ..request()
        })
        .unwrap();
        assert!(!args.iter().any(|a| a == POOL_FLAG));
        assert_eq!(args[3..7], ["--threads", "1", "--size", "1048576"]);
        assert_eq!(args[7..], ["-d", "downloads"]);
    }

    #[test]
    fn missing_pool_size_is_omitted() {
        let args = build_download_args(&DownloadRequest {
            pool_size: None,
            ..request()
        })
        .unwrap();
        assert!(!args.iter().any(|a| a == POOL_FLAG));
    }

    #[test]
    fn include_patterns_joined_into_one_value() {
        let args = build_download_args(&DownloadRequest {
            include: vec!["*.mp4".into(), "*.mkv".into()],
            ..request()
        })
        .unwrap();
        let flags = args.iter().filter(|a| *a == INCLUDE_FLAG).count();
        assert_eq!(flags, 1);
        let idx = args.iter().position(|a| a == INCLUDE_FLAG).unwrap();
        assert_eq!(args[idx + 1], "*.mp4,*.mkv");
        assert!(!args.iter().any(|a| a == EXCLUDE_FLAG));
    }

    #[test]
    fn optional_flags_follow_fixed_part() {
        let args = build_download_args(&DownloadRequest {
            locator: Locator::message("@news", "5-10"),
            resume: true,
            include: vec!["*.pdf".into()],
            exclude: vec!["*.tmp".into(), "*.part".into()],
            min_size: Some(0),
            max_size: Some(10_485_760),
            ..request()
        })
        .unwrap();
        assert_eq!(
            args,
            [
                "dl",
                "-u",
                "https://t.me/news/5-10",
                "--threads",
                "16",
                "--size",
                "1048576",
                "--pool",
                "8",
                "-d",
                "downloads",
                "--continue",
                "--include",
                "*.pdf",
                "--exclude",
                "*.tmp,*.part",
                "--min-size",
                "0",
                "--max-size",
                "10485760",
            ]
        );
    }

    #[test]
    fn inverted_size_bounds_are_rejected() {
        let err = build_download_args(&DownloadRequest {
            min_size: Some(100),
            max_size: Some(50),
            ..request()
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn bad_numbers_and_locators_are_rejected() {
        assert!(matches!(
            build_download_args(&DownloadRequest { threads: 0, ..request() }),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            build_download_args(&DownloadRequest { chunk_size: 0, ..request() }),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            build_download_args(&DownloadRequest {
                locator: Locator::message("", "1"),
                ..request()
            }),
            Err(Error::InvalidInput(_))
        ));
    }
}
