//! Rodio output for the software surface
//!
//! Owns the output stream of an open audio device and one sink per playing
//! sound. Rodio also decodes OGG Vorbis, MP3 and FLAC for the software
//! surface and converts sample rates and channel layouts.

use super::pcm::PcmBuffer;
use crate::foundation::collections::SoundId;
use rodio::buffer::SamplesBuffer;
use rodio::source::UniformSourceIterator;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::collections::HashMap;
use std::io::Cursor;

/// Open rodio output stream plus active sinks
pub struct PlaybackDevice {
    /// Audio output stream (must be kept alive)
    _output_stream: OutputStream,
    /// Output stream handle for creating sinks
    stream_handle: OutputStreamHandle,
    /// Sinks of sounds that were started
    sinks: HashMap<SoundId, Sink>,
}

impl PlaybackDevice {
    /// Open the default output device
    pub fn open() -> Result<Self, String> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| format!("Failed to create audio output: {e}"))?;

        log::info!("Rodio output stream opened");
        Ok(Self {
            _output_stream: stream,
            stream_handle,
            sinks: HashMap::new(),
        })
    }

    /// Start `pcm` from the beginning on a fresh sink
    pub fn play(
        &mut self,
        id: SoundId,
        pcm: &PcmBuffer,
        volume: f32,
        pitch: f32,
    ) -> Result<(), String> {
        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| format!("Failed to create sink: {e}"))?;
        sink.set_volume(volume);
        sink.set_speed(pitch);
        sink.append(SamplesBuffer::new(pcm.channels, pcm.sample_rate, pcm.samples.clone()));

        if let Some(previous) = self.sinks.insert(id, sink) {
            previous.stop();
        }
        Ok(())
    }

    /// Stop and forget the sink of `id`
    pub fn stop(&mut self, id: SoundId) {
        if let Some(sink) = self.sinks.remove(&id) {
            sink.stop();
        }
    }

    /// Pause the sink of `id`
    pub fn pause(&self, id: SoundId) {
        if let Some(sink) = self.sinks.get(&id) {
            sink.pause();
        }
    }

    /// Resume the sink of `id`
    pub fn resume(&self, id: SoundId) {
        if let Some(sink) = self.sinks.get(&id) {
            sink.play();
        }
    }

    /// Apply an effective volume to the sink of `id`
    pub fn set_volume(&self, id: SoundId, volume: f32) {
        if let Some(sink) = self.sinks.get(&id) {
            sink.set_volume(volume);
        }
    }

    /// Apply a playback speed factor to the sink of `id`
    pub fn set_pitch(&self, id: SoundId, pitch: f32) {
        if let Some(sink) = self.sinks.get(&id) {
            sink.set_speed(pitch);
        }
    }

    /// `true` if the sound is playing (not paused and not finished)
    pub fn is_playing(&self, id: SoundId) -> bool {
        self.sinks
            .get(&id)
            .is_some_and(|sink| !sink.is_paused() && !sink.empty())
    }

    /// Drop sinks that ran out of samples
    pub fn update(&mut self) {
        self.sinks.retain(|_id, sink| !sink.empty());
    }
}

impl Drop for PlaybackDevice {
    fn drop(&mut self) {
        for (_id, sink) in self.sinks.drain() {
            sink.stop();
        }
        log::info!("Rodio output stream closed");
    }
}

/// Decode OGG/MP3/FLAC bytes through rodio
pub fn decode_compressed(bytes: Vec<u8>) -> Result<PcmBuffer, String> {
    let decoder = Decoder::new(Cursor::new(bytes))
        .map_err(|e| format!("Failed to decode audio: {e}"))?;
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<f32> = decoder.convert_samples::<f32>().collect();

    if channels == 0 || sample_rate == 0 {
        return Err("decoder reported an empty stream".to_string());
    }

    Ok(PcmBuffer {
        samples,
        sample_rate,
        sample_size: 16,
        channels,
    })
}

/// Resample and remix `pcm` to `sample_rate` and `channels`
///
/// Stereo to mono keeps the first channel; mono to stereo duplicates it.
pub fn convert(pcm: &PcmBuffer, sample_rate: u32, channels: u16) -> PcmBuffer {
    let source = SamplesBuffer::new(pcm.channels, pcm.sample_rate, pcm.samples.clone());
    let mut samples: Vec<f32> =
        UniformSourceIterator::<_, f32>::new(source, channels, sample_rate).collect();
    samples.truncate(samples.len() - samples.len() % usize::from(channels));

    PcmBuffer {
        samples,
        sample_rate,
        sample_size: pcm.sample_size,
        channels,
    }
}
