//! Audio duration probing.
//!
//! Recordings get their duration measured once, at catalog ingest, and the
//! value is stored alongside the catalog entry. The player schedules the
//! bell chain off these stored durations.

use std::fs::File;
use std::path::Path;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::AudioError;

/// Decode just enough of the file at `path` to measure its duration in ms.
pub fn probe_duration_ms(path: &Path) -> Result<u64, AudioError> {
    let file = File::open(path).map_err(|source| AudioError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Unsupported(e.to_string()))?;
    let mut format = probed.format;

    let track = format.default_track().ok_or(AudioError::NoAudioTrack)?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    if let (Some(n_frames), Some(rate)) = (params.n_frames, params.sample_rate) {
        if rate > 0 {
            let ms = n_frames.saturating_mul(1_000) / u64::from(rate);
            debug!(path = %path.display(), ms, "duration from stream headers");
            return Ok(ms);
        }
    }

    // MP3 headers rarely carry a frame count; walk the packets instead.
    let time_base = params.time_base.ok_or(AudioError::UnknownDuration)?;
    let mut total_ts: u64 = 0;
    loop {
        match format.next_packet() {
            Ok(packet) => {
                if packet.track_id() == track_id {
                    total_ts += packet.dur();
                }
            }
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(AudioError::Unsupported(e.to_string())),
        }
    }
    let time = time_base.calc_time(total_ts);
    let ms = time.seconds * 1_000 + (time.frac * 1_000.0) as u64;
    debug!(path = %path.display(), ms, "duration from packet walk");
    Ok(ms)
}

/// Reject recordings longer than the configured maximum.
pub fn validate_track_duration(duration_ms: u64, max_secs: u64) -> Result<(), AudioError> {
    let secs = duration_ms / 1_000;
    if secs > max_secs {
        return Err(AudioError::TooLong { secs, max_secs });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_an_open_error() {
        let err = probe_duration_ms(Path::new("/nonexistent/clip.mp3")).unwrap_err();
        assert!(matches!(err, AudioError::Open { .. }));
    }

    #[test]
    fn garbage_bytes_are_unsupported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not audio at all").unwrap();
        let err = probe_duration_ms(file.path()).unwrap_err();
        assert!(matches!(
            err,
            AudioError::Unsupported(_) | AudioError::NoAudioTrack | AudioError::UnknownDuration
        ));
    }

    #[test]
    fn duration_bound_is_enforced() {
        assert!(validate_track_duration(90_000, 90).is_ok());
        let err = validate_track_duration(91_000, 90).unwrap_err();
        assert!(matches!(err, AudioError::TooLong { secs: 91, max_secs: 90 }));
    }
}
