pub mod constants;
pub mod convert;
pub mod demux;
pub mod pipeline;
pub mod source;
pub mod wav;

pub use convert::{Resampler, Stereo16};
pub use demux::{DecodedSource, OpenedInput, open_format, open_path, open_source};
pub use pipeline::{DecodedStream, PcmFormat};
pub use source::{BoxedSource, DataRegion, PcmSource};
