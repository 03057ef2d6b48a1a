//! Segment duration policy.
//!
//! Durations are assigned in index order against a running timeline
//! cursor so that, when the music track has detected beats, every
//! segment boundary lands on a beat. Without beats the policy
//! degenerates to raw audio length (narrated) or a fixed minimum
//! (silent).

use reelgen_media::snap_forward;

/// Duration for a narrated segment whose audio is `audio_len` seconds,
/// starting at `cursor` on the output timeline.
///
/// With beats, the segment is extended to the first beat at or after
/// the natural end, so narration never gets cut. Without beats, the
/// audio length is used as-is.
pub fn narrated_duration(beats: &[f64], cursor: f64, audio_len: f64) -> f64 {
    let natural_end = cursor + audio_len;
    match snap_forward(beats, natural_end) {
        Some(beat) => beat - cursor,
        None => audio_len,
    }
}

/// Duration for a segment without narration audio.
///
/// With beats, the segment runs from `cursor` to the first beat at or
/// after `cursor + min_duration`. Without beats, exactly `min_duration`.
pub fn silent_duration(beats: &[f64], cursor: f64, min_duration: f64) -> f64 {
    match snap_forward(beats, cursor + min_duration) {
        Some(beat) => beat - cursor,
        None => min_duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrated_snaps_forward_to_beat() {
        let beats = [0.0, 1.6, 3.2, 4.8, 6.4];
        // 4.2s of audio from cursor 0 ends between beats; extend to 4.8.
        assert_eq!(narrated_duration(&beats, 0.0, 4.2), 4.8);
    }

    #[test]
    fn test_narrated_exact_beat_is_kept() {
        let beats = [0.0, 1.6, 3.2, 4.8];
        assert_eq!(narrated_duration(&beats, 0.0, 3.2), 3.2);
    }

    #[test]
    fn test_narrated_without_beats_uses_audio_length() {
        assert_eq!(narrated_duration(&[], 0.0, 4.2), 4.2);
    }

    #[test]
    fn test_narrated_past_last_beat_uses_audio_length() {
        let beats = [0.0, 1.6];
        assert_eq!(narrated_duration(&beats, 0.0, 4.2), 4.2);
    }

    #[test]
    fn test_silent_snaps_past_minimum() {
        let beats = [0.0, 1.6, 3.2, 4.8];
        // min 3.0 from cursor 0 snaps to beat 3.2.
        assert_eq!(silent_duration(&beats, 0.0, 3.0), 3.2);
    }

    #[test]
    fn test_silent_without_beats_uses_minimum() {
        assert_eq!(silent_duration(&[], 2.0, 3.0), 3.0);
    }

    #[test]
    fn test_cursor_offsets_are_respected() {
        let beats = [0.0, 1.6, 3.2, 4.8, 6.4, 8.0];
        // Segment starting at 3.2 with 2.0s of audio ends at 5.2; snap to 6.4.
        let d = narrated_duration(&beats, 3.2, 2.0);
        assert!((d - 3.2).abs() < 1e-9);
    }
}
