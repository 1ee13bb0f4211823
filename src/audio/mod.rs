pub mod bands;
pub mod decode;
pub mod features;
pub mod scale;
pub mod stft;
