//! Minimal PCM WAV parsing and concatenation for podcast assembly.
//!
//! Synthesized turns arrive as independent WAV files from the TTS backend;
//! the assembler strips their headers, checks that every turn shares one
//! format, inserts inter-turn silence, and emits a single combined file.
//! Only uncompressed PCM is accepted.

use crate::error::{Error, Result};

/// Decoded PCM audio from one WAV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavAudio {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// Raw PCM sample data (the `data` chunk payload).
    pub data: Vec<u8>,
}

impl WavAudio {
    /// Parse a RIFF/WAVE file, walking chunks until `fmt ` and `data` are
    /// both found.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(Error::Validation("not a RIFF/WAVE file".into()));
        }

        let mut format: Option<(u16, u16, u32, u16)> = None;
        let mut data: Option<Vec<u8>> = None;

        let mut pos = 12;
        while pos + 8 <= bytes.len() {
            let id = &bytes[pos..pos + 4];
            let size = u32::from_le_bytes([
                bytes[pos + 4],
                bytes[pos + 5],
                bytes[pos + 6],
                bytes[pos + 7],
            ]) as usize;
            let body_start = pos + 8;
            let body_end = (body_start + size).min(bytes.len());

            match id {
                b"fmt " => {
                    if size < 16 {
                        return Err(Error::Validation("truncated fmt chunk".into()));
                    }
                    let b = &bytes[body_start..body_start + 16];
                    let audio_format = u16::from_le_bytes([b[0], b[1]]);
                    let channels = u16::from_le_bytes([b[2], b[3]]);
                    let sample_rate = u32::from_le_bytes([b[4], b[5], b[6], b[7]]);
                    let bits_per_sample = u16::from_le_bytes([b[14], b[15]]);
                    format = Some((audio_format, channels, sample_rate, bits_per_sample));
                }
                b"data" => {
                    data = Some(bytes[body_start..body_end].to_vec());
                }
                _ => {}
            }

            // Chunks are word-aligned.
            pos = body_start + size + (size & 1);
        }

        let (audio_format, channels, sample_rate, bits_per_sample) =
            format.ok_or_else(|| Error::Validation("missing fmt chunk".into()))?;
        if audio_format != 1 {
            return Err(Error::Validation(format!(
                "unsupported WAV audio format {} (only PCM)",
                audio_format
            )));
        }
        let data = data.ok_or_else(|| Error::Validation("missing data chunk".into()))?;

        Ok(Self {
            channels,
            sample_rate,
            bits_per_sample,
            data,
        })
    }

    /// Encode this audio back into a complete WAV file.
    pub fn encode(&self) -> Vec<u8> {
        let block_align = self.channels * (self.bits_per_sample / 8);
        let byte_rate = self.sample_rate * block_align as u32;
        let data_len = self.data.len() as u32;

        let mut out = Vec::with_capacity(44 + self.data.len());
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&self.bits_per_sample.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.extend_from_slice(&self.data);
        out
    }

    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        let block_align = (self.channels * (self.bits_per_sample / 8)) as u64;
        if block_align == 0 || self.sample_rate == 0 {
            return 0;
        }
        let frames = self.data.len() as u64 / block_align;
        frames * 1000 / self.sample_rate as u64
    }
}

/// Incremental concatenation of same-format WAV segments.
#[derive(Debug, Default)]
pub struct WavAssembler {
    format: Option<(u16, u32, u16)>,
    data: Vec<u8>,
}

impl WavAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one WAV file's samples. The first segment fixes the format;
    /// later segments must match it.
    pub fn push(&mut self, wav_bytes: &[u8]) -> Result<()> {
        let audio = WavAudio::parse(wav_bytes)?;
        let fmt = (audio.channels, audio.sample_rate, audio.bits_per_sample);
        match self.format {
            None => self.format = Some(fmt),
            Some(expected) if expected != fmt => {
                return Err(Error::Validation(format!(
                    "WAV format mismatch: expected {:?}, got {:?}",
                    expected, fmt
                )));
            }
            Some(_) => {}
        }
        self.data.extend_from_slice(&audio.data);
        Ok(())
    }

    /// Append silence. No-op before the first segment establishes a format.
    pub fn push_silence(&mut self, ms: u32) {
        if let Some((channels, sample_rate, bits)) = self.format {
            let block_align = (channels * (bits / 8)) as usize;
            let frames = (sample_rate as u64 * ms as u64 / 1000) as usize;
            self.data.extend(std::iter::repeat(0u8).take(frames * block_align));
        }
    }

    /// Whether any audio has been appended.
    pub fn is_empty(&self) -> bool {
        self.format.is_none()
    }

    /// Finish and encode the combined file.
    pub fn finish(self) -> Result<Vec<u8>> {
        let (channels, sample_rate, bits_per_sample) = self
            .format
            .ok_or_else(|| Error::Validation("no audio segments to assemble".into()))?;
        Ok(WavAudio {
            channels,
            sample_rate,
            bits_per_sample,
            data: self.data,
        }
        .encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(sample_rate: u32, frames: usize) -> Vec<u8> {
        let audio = WavAudio {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            data: (0..frames)
                .flat_map(|i| ((i as i16).wrapping_mul(7)).to_le_bytes())
                .collect(),
        };
        audio.encode()
    }

    #[test]
    fn parse_round_trips_encode() {
        let original = tone(24_000, 480);
        let parsed = WavAudio::parse(&original).unwrap();
        assert_eq!(parsed.channels, 1);
        assert_eq!(parsed.sample_rate, 24_000);
        assert_eq!(parsed.bits_per_sample, 16);
        assert_eq!(parsed.data.len(), 960);
        assert_eq!(parsed.encode(), original);
    }

    #[test]
    fn parse_rejects_non_wav() {
        assert!(WavAudio::parse(b"OggS12345678").is_err());
        assert!(WavAudio::parse(&[]).is_err());
    }

    #[test]
    fn duration_is_computed_from_frames() {
        let parsed = WavAudio::parse(&tone(24_000, 24_000)).unwrap();
        assert_eq!(parsed.duration_ms(), 1000);
    }

    #[test]
    fn assembler_concatenates_segments() {
        let mut asm = WavAssembler::new();
        asm.push(&tone(24_000, 100)).unwrap();
        asm.push(&tone(24_000, 50)).unwrap();
        let combined = WavAudio::parse(&asm.finish().unwrap()).unwrap();
        assert_eq!(combined.data.len(), (100 + 50) * 2);
    }

    #[test]
    fn assembler_inserts_silence() {
        let mut asm = WavAssembler::new();
        asm.push(&tone(24_000, 100)).unwrap();
        asm.push_silence(500);
        asm.push(&tone(24_000, 100)).unwrap();
        let combined = WavAudio::parse(&asm.finish().unwrap()).unwrap();
        // 500 ms at 24 kHz mono 16-bit = 12_000 frames = 24_000 bytes.
        assert_eq!(combined.data.len(), 200 * 2 + 24_000);
    }

    #[test]
    fn assembler_rejects_mixed_formats() {
        let mut asm = WavAssembler::new();
        asm.push(&tone(24_000, 100)).unwrap();
        assert!(asm.push(&tone(44_100, 100)).is_err());
    }

    #[test]
    fn assembler_empty_fails() {
        assert!(WavAssembler::new().finish().is_err());
    }

    #[test]
    fn silence_before_first_segment_is_noop() {
        let mut asm = WavAssembler::new();
        asm.push_silence(500);
        assert!(asm.is_empty());
    }
}
