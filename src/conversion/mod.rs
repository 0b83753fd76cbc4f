use crate::config::{ConfigurationError, Settings};
use crate::constants::{
    AUDIO_BITRATE, AUDIO_CODEC, AUDIO_SAMPLE_RATE, ENCODER_SPEED_PRESET, NULL_DEVICE,
    OUTPUT_EXTENSION, OUTPUT_SUFFIX, PASS_LOG_SUFFIX, VIDEO_CODEC,
};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub mod process;

/// One invocation of the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderPass {
    pub args: Vec<OsString>,
}

/// Everything needed to run one compression: one pass, or two for two-pass
/// rate control, always in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderCommand {
    pub output_path: PathBuf,
    pub passes: Vec<EncoderPass>,
    pub pass_log: Option<PathBuf>,
}

impl EncoderCommand {
    /// Statistics files the encoder leaves behind for a two-pass run.
    pub fn pass_log_files(&self) -> Vec<PathBuf> {
        match &self.pass_log {
            Some(prefix) => {
                let prefix = prefix.as_os_str().to_owned();
                ["-0.log", "-0.log.mbtree"]
                    .into_iter()
                    .map(|suffix| {
                        let mut name = prefix.clone();
                        name.push(suffix);
                        PathBuf::from(name)
                    })
                    .collect()
            }
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassKind {
    Single,
    Analysis,
    Final,
}

impl PassKind {
    fn number(&self) -> Option<&'static str> {
        match self {
            PassKind::Single => None,
            PassKind::Analysis => Some("1"),
            PassKind::Final => Some("2"),
        }
    }
}

/// `{output_folder}/{source stem}_compressed.mp4`, whatever the source container.
pub fn output_path_for(source: &Path, output_folder: &Path) -> Result<PathBuf, ConfigurationError> {
    let stem = source_stem(source)?;
    let mut file_name = stem.to_owned();
    file_name.push(OUTPUT_SUFFIX);
    file_name.push(".");
    file_name.push(OUTPUT_EXTENSION);
    Ok(output_folder.join(file_name))
}

fn source_stem(source: &Path) -> Result<&OsStr, ConfigurationError> {
    source
        .file_stem()
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| ConfigurationError::InvalidSource {
            path: source.display().to_string(),
        })
}

/// Renders resolved settings into the encoder argument vectors.
///
/// Pure: the same settings and paths always give the same command.
pub fn build_command(
    settings: &Settings,
    source: &Path,
    output_folder: &Path,
) -> Result<EncoderCommand, ConfigurationError> {
    if output_folder.as_os_str().is_empty() {
        return Err(ConfigurationError::MissingOutputFolder);
    }

    let output_path = output_path_for(source, output_folder)?;

    if !settings.two_pass {
        return Ok(EncoderCommand {
            passes: vec![render_pass(settings, source, &output_path, None, PassKind::Single)],
            output_path,
            pass_log: None,
        });
    }

    let mut log_name = source_stem(source)?.to_owned();
    log_name.push(OUTPUT_SUFFIX);
    log_name.push(PASS_LOG_SUFFIX);
    let pass_log = output_folder.join(log_name);

    let passes = vec![
        render_pass(settings, source, &output_path, Some(&pass_log), PassKind::Analysis),
        render_pass(settings, source, &output_path, Some(&pass_log), PassKind::Final),
    ];

    Ok(EncoderCommand {
        output_path,
        passes,
        pass_log: Some(pass_log),
    })
}

fn render_pass(
    settings: &Settings,
    source: &Path,
    output_path: &Path,
    pass_log: Option<&Path>,
    kind: PassKind,
) -> EncoderPass {
    let mut args: Vec<OsString> = Vec::new();

    args.push("-i".into());
    args.push(source.as_os_str().to_owned());

    if let Some(height) = settings.resolution.scale_height() {
        // -2 keeps the aspect ratio and rounds the width to an even number
        push_all(&mut args, &["-vf", &format!("scale=-2:{}", height)]);
    }

    if let Some(fps) = settings.frame_limit.fps() {
        push_all(&mut args, &["-r", &fps.to_string()]);
    }

    push_all(
        &mut args,
        &[
            "-vcodec",
            VIDEO_CODEC,
            "-preset",
            ENCODER_SPEED_PRESET,
            "-b:v",
            settings.bitrate.as_str(),
        ],
    );

    if let (Some(number), Some(log)) = (kind.number(), pass_log) {
        push_all(&mut args, &["-pass", number, "-passlogfile"]);
        args.push(log.as_os_str().to_owned());
    }

    if kind == PassKind::Analysis {
        // First pass only gathers statistics; nothing is kept
        push_all(&mut args, &["-an", "-f", "null", "-y", NULL_DEVICE]);
        return EncoderPass { args };
    }

    if settings.audio_enabled {
        push_all(
            &mut args,
            &[
                "-acodec",
                AUDIO_CODEC,
                "-b:a",
                AUDIO_BITRATE,
                "-ar",
                AUDIO_SAMPLE_RATE,
            ],
        );
    } else {
        args.push("-an".into());
    }

    push_all(&mut args, &["-movflags", "+faststart", "-y"]);
    args.push(output_path.as_os_str().to_owned());

    EncoderPass { args }
}

fn push_all(args: &mut Vec<OsString>, values: &[&str]) {
    args.extend(values.iter().map(OsString::from));
}

/// A single compression request with its own copy of the settings.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub source_path: PathBuf,
    pub settings: Settings,
    pub command: EncoderCommand,
}

impl Job {
    pub fn new(settings: &Settings, source_path: &Path) -> Result<Self, ConfigurationError> {
        let output_folder = settings
            .output_folder()
            .ok_or(ConfigurationError::MissingOutputFolder)?;
        let command = build_command(settings, source_path, output_folder)?;

        Ok(Self {
            id: Uuid::new_v4(),
            source_path: source_path.to_path_buf(),
            settings: settings.clone(),
            command,
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.command.output_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Bitrate, FrameLimit, Resolution};
    use crate::presets;

    fn strings(pass: &EncoderPass) -> Vec<String> {
        pass.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    fn source() -> PathBuf {
        PathBuf::from("/videos/holiday clip.mov")
    }

    fn folder() -> PathBuf {
        PathBuf::from("/videos/out")
    }

    #[test]
    fn test_output_path_forces_mp4() {
        let path = output_path_for(Path::new("/in/clip.mkv"), Path::new("/out")).unwrap();
        assert_eq!(path, PathBuf::from("/out/clip_compressed.mp4"));

        let path = output_path_for(Path::new("/in/archive.2024.avi"), Path::new("/out")).unwrap();
        assert_eq!(path, PathBuf::from("/out/archive.2024_compressed.mp4"));
    }

    #[test]
    fn test_default_settings_single_pass() {
        let command = build_command(&Settings::default(), &source(), &folder()).unwrap();

        assert_eq!(command.passes.len(), 1);
        assert_eq!(command.pass_log, None);
        assert_eq!(
            strings(&command.passes[0]),
            vec![
                "-i",
                "/videos/holiday clip.mov",
                "-r",
                "60",
                "-vcodec",
                "libx264",
                "-preset",
                "medium",
                "-b:v",
                "2000k",
                "-acodec",
                "aac",
                "-b:a",
                "192k",
                "-ar",
                "44100",
                "-movflags",
                "+faststart",
                "-y",
                "/videos/out/holiday clip_compressed.mp4",
            ]
        );
    }

    #[test]
    fn test_scale_and_uncapped_frame_rate() {
        let mut settings = Settings::default();
        settings.resolution = Resolution::R720;
        settings.frame_limit = FrameLimit::Uncapped;
        settings.audio_enabled = false;

        let command = build_command(&settings, &source(), &folder()).unwrap();
        let args = strings(&command.passes[0]);

        assert_eq!(&args[..4], ["-i", "/videos/holiday clip.mov", "-vf", "scale=-2:720"]);
        assert!(!args.contains(&"-r".to_string()));
        assert!(args.contains(&"-an".to_string()));
        assert!(!args.contains(&"-acodec".to_string()));
    }

    #[test]
    fn test_480p_scale_precedes_frame_cap() {
        let mut settings = Settings::default();
        settings.resolution = Resolution::R480;
        settings.frame_limit = FrameLimit::Fps30;

        let args = strings(&build_command(&settings, &source(), &folder()).unwrap().passes[0]);
        let scale = args.iter().position(|a| a == "scale=-2:480").unwrap();
        let rate = args.iter().position(|a| a == "-r").unwrap();
        let codec = args.iter().position(|a| a == "-vcodec").unwrap();
        assert!(scale < rate && rate < codec);
        assert_eq!(args[rate + 1], "30");
    }

    #[test]
    fn test_two_pass_renders_both_passes() {
        let settings = presets::apply(Settings::default(), "Ultra");
        let command = build_command(&settings, &source(), &folder()).unwrap();

        assert_eq!(command.passes.len(), 2);
        let log = "/videos/out/holiday clip_compressed_passlog";
        assert_eq!(command.pass_log, Some(PathBuf::from(log)));

        let first = strings(&command.passes[0]);
        let pass = first.iter().position(|a| a == "-pass").unwrap();
        assert_eq!(&first[pass..pass + 4], ["-pass", "1", "-passlogfile", log]);
        assert_eq!(&first[pass + 4..], ["-an", "-f", "null", "-y", NULL_DEVICE]);

        let second = strings(&command.passes[1]);
        let pass = second.iter().position(|a| a == "-pass").unwrap();
        assert_eq!(&second[pass..pass + 4], ["-pass", "2", "-passlogfile", log]);
        assert_eq!(second[pass + 4], "-acodec");
        assert_eq!(
            second.last().map(String::as_str),
            Some("/videos/out/holiday clip_compressed.mp4")
        );

        assert_eq!(
            command.pass_log_files(),
            vec![
                PathBuf::from(format!("{}-0.log", log)),
                PathBuf::from(format!("{}-0.log.mbtree", log)),
            ]
        );
    }

    #[test]
    fn test_builder_is_referentially_transparent() {
        let mut variants = Vec::new();
        for resolution in Resolution::ALL {
            for frame_limit in FrameLimit::ALL {
                for audio_enabled in [true, false] {
                    for two_pass in [true, false] {
                        let mut settings = Settings::default();
                        settings.resolution = resolution;
                        settings.frame_limit = frame_limit;
                        settings.audio_enabled = audio_enabled;
                        settings.two_pass = two_pass;
                        settings.bitrate = Bitrate::new("1500k").unwrap();
                        variants.push(settings);
                    }
                }
            }
        }

        for settings in &variants {
            let first = build_command(settings, &source(), &folder()).unwrap();
            let second = build_command(&settings.clone(), &source(), &folder()).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_empty_output_folder_is_refused() {
        let result = build_command(&Settings::default(), &source(), Path::new(""));
        assert_eq!(result, Err(ConfigurationError::MissingOutputFolder));

        let job = Job::new(&Settings::default(), &source());
        assert!(matches!(job, Err(ConfigurationError::MissingOutputFolder)));
    }

    #[test]
    fn test_source_without_file_name_is_refused() {
        let result = build_command(&Settings::default(), Path::new("/"), &folder());
        assert!(matches!(result, Err(ConfigurationError::InvalidSource { .. })));
    }

    #[test]
    fn test_job_owns_a_snapshot() {
        let mut live = Settings::default();
        live.output_folder = folder();
        let job = Job::new(&live, &source()).unwrap();

        live.bitrate = Bitrate::new("500k").unwrap();
        live.output_folder = PathBuf::from("/elsewhere");

        assert_eq!(job.settings.bitrate.as_str(), "2000k");
        assert_eq!(job.output_path(), Path::new("/videos/out/holiday clip_compressed.mp4"));
    }
}
