//! Apply setup: config overrides, mode resolution, watermark loading.

use std::path::{Path, PathBuf};

use tilemark_core::{Config, FileDiscovery, ManifestFormat, ProcessOptions, WatermarkProcessor};

use super::types::Mode;
use super::{ApplyArgs, ApplyContext};

/// Validate input, merge CLI flags into config, and load the watermark.
pub async fn setup_processor(
    args: &ApplyArgs,
    mut config: Config,
) -> anyhow::Result<ApplyContext> {
    if !args.source.exists() {
        anyhow::bail!(
            "Source path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.source
        );
    }

    let watermark_path = match args.watermark.clone().or_else(|| config.watermark_path()) {
        Some(path) => path,
        None => anyhow::bail!(
            "No watermark image given.\n\n  \
             Hint: Pass --watermark <FILE> or set [watermark] path in the config file."
        ),
    };

    // CLI flags override config values
    if let Some(opacity) = args.opacity {
        config.watermark.opacity = opacity;
    }
    if let Some(quality) = args.quality {
        config.output.jpeg_quality = quality;
    }
    if args.recursive {
        config.processing.recursive = true;
    }
    let thumbnail = match args.thumbnail {
        Some(size) => Some(size),
        None => config.thumbnail_size()?,
    };
    if let Some(size) = thumbnail {
        if let Err(e) = config.check_thumbnail_size(size) {
            anyhow::bail!(
                "{e}\n\n  Hint: Choose a smaller --thumbnail, or raise [limits] max_image_dimension."
            );
        }
    }

    let mode = resolve_mode(&args.source, args.output.as_deref(), &config);
    tracing::debug!("Mode: {:?}", mode);
    if let Mode::Batch { output_dir } = &mode {
        if output_covers_source(&args.source, output_dir) {
            anyhow::bail!(
                "Output directory {:?} contains the source directory, so every input would be skipped.\n\n  \
                 Hint: Pass an --output directory outside {:?}, or omit it to use {:?}.",
                output_dir,
                args.source,
                args.source.join(&config.output.dir_name)
            );
        }
    }

    let processor =
        WatermarkProcessor::load(&config, &watermark_path, config.watermark.opacity).await?;
    tracing::info!(
        "Watermark loaded: {:?} ({}x{}, opacity {})",
        watermark_path,
        processor.watermark().width(),
        processor.watermark().height(),
        processor.watermark().opacity()
    );

    // Keep the watermark and earlier results out of the batch
    let mut excluded = vec![watermark_path];
    if let Mode::Batch { output_dir } = &mode {
        excluded.push(output_dir.clone());
    }
    let discovery = FileDiscovery::new(config.processing.clone()).with_excluded(excluded);
    let processor = processor.with_discovery(discovery);

    let options = ProcessOptions {
        thumbnail,
        overwrite: args.overwrite,
    };
    if let Some(size) = thumbnail {
        tracing::info!("Thumbnailing to {size} before watermarking");
    }

    let manifest_format: ManifestFormat = args.format.into();

    Ok(ApplyContext {
        processor,
        options,
        mode,
        manifest_format,
    })
}

/// Decide between single-file and batch mode, and where output goes.
///
/// Single: `--output` if it is not an existing directory, otherwise
/// `<stem><suffix>.jpg` beside the source (or inside that directory).
/// Batch: `--output`, or `<source>/<dir_name>`.
pub fn resolve_mode(source: &Path, output: Option<&Path>, config: &Config) -> Mode {
    if source.is_dir() {
        let output_dir = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| source.join(&config.output.dir_name));
        return Mode::Batch { output_dir };
    }

    let default_name = format!("{}{}.jpg", file_stem(source), config.output.suffix);
    let output = match output {
        Some(dir) if dir.is_dir() => dir.join(default_name),
        Some(file) => file.to_path_buf(),
        None => source.with_file_name(default_name),
    };
    Mode::Single { output }
}

/// Output path for one batch file, mirroring its position below `source_dir`.
pub fn batch_output_path(source_dir: &Path, output_dir: &Path, file: &Path) -> PathBuf {
    let relative_parent = file
        .parent()
        .and_then(|parent| parent.strip_prefix(source_dir).ok())
        .unwrap_or_else(|| Path::new(""));
    output_dir
        .join(relative_parent)
        .join(format!("{}.jpg", file_stem(file)))
}

/// True when the source directory is the output directory or lies below it.
///
/// Batch discovery excludes the output tree, so such a run would find nothing.
fn output_covers_source(source: &Path, output_dir: &Path) -> bool {
    match (
        std::fs::canonicalize(source),
        std::fs::canonicalize(output_dir),
    ) {
        (Ok(source), Ok(output_dir)) => source.starts_with(output_dir),
        _ => false,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_mode_default_output_beside_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.png");
        std::fs::write(&source, b"x").unwrap();

        let mode = resolve_mode(&source, None, &Config::default());
        assert_eq!(
            mode,
            Mode::Single {
                output: dir.path().join("photo_watermarked.jpg")
            }
        );
    }

    #[test]
    fn test_single_mode_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.png");
        std::fs::write(&source, b"x").unwrap();
        let output = dir.path().join("final.jpg");

        let mode = resolve_mode(&source, Some(&output), &Config::default());
        assert_eq!(mode, Mode::Single { output });
    }

    #[test]
    fn test_single_mode_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.png");
        std::fs::write(&source, b"x").unwrap();
        let out_dir = dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();

        let mode = resolve_mode(&source, Some(&out_dir), &Config::default());
        assert_eq!(
            mode,
            Mode::Single {
                output: out_dir.join("photo_watermarked.jpg")
            }
        );
    }

    #[test]
    fn test_batch_mode_default_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mode = resolve_mode(dir.path(), None, &Config::default());
        assert_eq!(
            mode,
            Mode::Batch {
                output_dir: dir.path().join("watermarked")
            }
        );
    }

    #[test]
    fn test_output_covers_source() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("shots");
        std::fs::create_dir(&nested).unwrap();

        assert!(output_covers_source(&nested, &nested));
        assert!(output_covers_source(&nested, dir.path()));
        assert!(output_covers_source(&nested, &nested.join(".")));
        assert!(!output_covers_source(dir.path(), &nested));
        // Not created yet, so it cannot hold the source
        assert!(!output_covers_source(&nested, &dir.path().join("fresh")));
    }

    fn write_logo(dir: &Path) -> PathBuf {
        let logo = dir.join("logo.png");
        image::RgbaImage::from_pixel(8, 8, image::Rgba([255, 255, 255, 255]))
            .save(&logo)
            .unwrap();
        logo
    }

    #[tokio::test]
    async fn test_setup_rejects_output_equal_to_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        let logo = write_logo(dir.path());

        let args = ApplyArgs {
            source: dir.path().to_path_buf(),
            watermark: Some(logo),
            output: Some(dir.path().to_path_buf()),
            ..ApplyArgs::default()
        };
        let err = setup_processor(&args, Config::default())
            .await
            .err()
            .unwrap();
        let msg = err.to_string();
        assert!(msg.contains("contains the source directory"));
        assert!(msg.contains("Hint"));
    }

    #[tokio::test]
    async fn test_setup_rejects_thumbnail_over_dimension_limit() {
        let dir = tempfile::tempdir().unwrap();
        let logo = write_logo(dir.path());
        let mut config = Config::default();
        config.limits.max_image_dimension = 500;

        let args = ApplyArgs {
            source: dir.path().to_path_buf(),
            watermark: Some(logo.clone()),
            thumbnail: Some("501x100".parse().unwrap()),
            ..ApplyArgs::default()
        };
        let err = setup_processor(&args, config.clone())
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("501x100"));
        assert!(err.to_string().contains("max_image_dimension"));

        let args = ApplyArgs {
            thumbnail: Some("500x100".parse().unwrap()),
            ..args
        };
        let ctx = setup_processor(&args, config).await.unwrap();
        assert_eq!(ctx.options.thumbnail, Some("500x100".parse().unwrap()));
    }

    #[test]
    fn test_batch_output_path_mirrors_subdirectories() {
        let src = Path::new("/photos");
        let out = Path::new("/export");
        assert_eq!(
            batch_output_path(src, out, Path::new("/photos/a.png")),
            PathBuf::from("/export/a.jpg")
        );
        assert_eq!(
            batch_output_path(src, out, Path::new("/photos/2024/b.jpeg")),
            PathBuf::from("/export/2024/b.jpg")
        );
    }
}
