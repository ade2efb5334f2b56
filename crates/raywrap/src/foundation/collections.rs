//! Generational id tables for native resources

pub use slotmap::{Key, SlotMap};

slotmap::new_key_type! {
    /// Native id of a CPU-side pixel buffer
    pub struct ImageId;
    /// Native id of a GPU texture
    pub struct TextureId;
    /// Native id of a decoded audio sample buffer
    pub struct WaveId;
    /// Native id of a playable sound living on the audio device
    pub struct SoundId;
}

/// Id-keyed storage for one kind of native resource
///
/// Keys are generational, so an id that was released and whose slot got
/// reused is reported as missing instead of aliasing the new resource.
pub type HandleMap<K, T> = SlotMap<K, T>;
