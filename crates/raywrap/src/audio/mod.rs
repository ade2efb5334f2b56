//! Audio: the output device, decoded sample buffers and playable sounds
//!
//! A [`Wave`] lives in CPU memory and can be cropped, reformatted and
//! exported without any device. A [`Sound`] is a copy of a wave placed on an
//! open [`AudioDevice`].

mod device;
mod sound;
mod wave;

pub use device::AudioDevice;
pub use sound::Sound;
pub use wave::Wave;
