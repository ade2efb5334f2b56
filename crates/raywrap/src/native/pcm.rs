//! PCM sample buffers: format detection and RIFF/WAVE coding
//!
//! Samples are held as interleaved `f32` in `[-1.0, 1.0]`. The stored
//! `sample_size` records the depth the buffer represents; requantizing
//! rounds to it so the data matches what an export would write.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::{Cursor, Seek, Write};

/// Container format detected from magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// RIFF/WAVE
    Wav,
    /// OGG Vorbis
    Ogg,
    /// MP3
    Mp3,
    /// FLAC
    Flac,
    /// Unknown format
    Unknown,
}

impl AudioFormat {
    /// Detect the container from the first bytes of a file
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.len() < 4 {
            return Self::Unknown;
        }

        match &bytes[0..4] {
            b"RIFF" => Self::Wav,
            b"OggS" => Self::Ogg,
            b"fLaC" => Self::Flac,
            // MP3 can start with ID3 tag or frame sync
            [0xFF, 0xFB, _, _] | [0xFF, 0xFA, _, _] | [b'I', b'D', b'3', _] => Self::Mp3,
            _ => Self::Unknown,
        }
    }
}

/// Decoded, interleaved sample buffer
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    /// Interleaved samples in `[-1.0, 1.0]`
    pub samples: Vec<f32>,
    /// Frames per second
    pub sample_rate: u32,
    /// Bits per stored sample
    pub sample_size: u16,
    /// Interleaved channels
    pub channels: u16,
}

/// Sample depths the buffer can represent
pub const SUPPORTED_SAMPLE_SIZES: [u16; 4] = [8, 16, 24, 32];

impl PcmBuffer {
    /// Frames in the buffer
    pub fn frame_count(&self) -> u32 {
        if self.channels == 0 {
            return 0;
        }
        (self.samples.len() / usize::from(self.channels)) as u32
    }

    /// Frames left after resampling to `sample_rate`
    pub fn frames_at(&self, sample_rate: u32) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        u64::from(self.frame_count()) * u64::from(sample_rate) / u64::from(self.sample_rate)
    }

    /// Keep frames `[start, end)`
    pub fn crop(&mut self, start: u32, end: u32) {
        let channels = usize::from(self.channels);
        let from = start as usize * channels;
        let to = end as usize * channels;
        self.samples.truncate(to);
        self.samples.drain(..from);
    }

    /// Round samples to the grid of `sample_size`; 32-bit stays float
    pub fn requantize(&mut self, sample_size: u16) {
        self.sample_size = sample_size;
        let scale = match sample_size {
            8 => 128.0,
            16 => 32_768.0,
            24 => 8_388_608.0,
            _ => return,
        };
        for s in &mut self.samples {
            *s = ((*s * scale).round() / scale).clamp(-1.0, (scale - 1.0) / scale);
        }
    }

    /// Decode a RIFF/WAVE file
    pub fn decode_wav(bytes: &[u8]) -> Result<Self, hound::Error> {
        let mut reader = WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();

        let samples = match spec.sample_format {
            SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
            SampleFormat::Int => {
                let scale = f64::from(1u32 << (spec.bits_per_sample - 1));
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| (f64::from(v) / scale) as f32))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
            sample_size: spec.bits_per_sample,
            channels: spec.channels,
        })
    }

    /// Encode as RIFF/WAVE at the buffer's sample size
    ///
    /// 32-bit buffers are written as IEEE float, the rest as integer PCM.
    pub fn encode_wav<W: Write + Seek>(&self, out: W) -> Result<(), hound::Error> {
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.sample_size,
            sample_format: if self.sample_size == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        };
        let mut writer = WavWriter::new(out, spec)?;

        for &sample in &self.samples {
            let s = sample.clamp(-1.0, 1.0);
            match self.sample_size {
                8 => writer.write_sample(scale_to_int(s, 8) as i8)?,
                16 => writer.write_sample(scale_to_int(s, 16) as i16)?,
                24 => writer.write_sample(scale_to_int(s, 24))?,
                _ => writer.write_sample(s)?,
            }
        }
        writer.finalize()
    }
}

/// Integer sample for `s` at a depth of `bits`
fn scale_to_int(s: f32, bits: u16) -> i32 {
    let scale = f64::from(1u32 << (bits - 1));
    (f64::from(s) * scale).round().clamp(-scale, scale - 1.0) as i32
}
