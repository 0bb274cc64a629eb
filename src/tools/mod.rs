mod background_job;
mod duration_probe;
mod ffprobe_info;
mod path_validator;
mod video_scanner;

pub use background_job::{JobHandle, JobMessage, spawn_job};
pub use duration_probe::{
    DEFAULT_FALLBACK_SECONDS, DurationOrigin, DurationProbe, DurationSource, FfprobeFormatDuration,
    FfprobeFrameCount, ProbedDuration,
};
pub use ffprobe_info::{DEFAULT_PROBE_TIMEOUT, probe_format_duration, probe_frame_count_duration};
pub use path_validator::{ensure_directory_exists, validate_directory_exists, validate_file_exists};
pub use video_scanner::{VideoFileEntry, folder_name, scan_video_files};
