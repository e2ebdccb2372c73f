use crate::video::decode::Decoder;
use crate::video::decode::Rational;
use crate::video::decode::VideoDetails;
use crate::video::pixel::Pixel;
use crate::video::{ChromaSampling, FrameInfo};
use std::io::Read;

/// Maps a y4m color space onto the chroma sampling the remapper handles.
pub fn map_y4m_color_space(color_space: y4m::Colorspace) -> ChromaSampling {
    use crate::video::ChromaSampling::*;
    use y4m::Colorspace::*;
    match color_space {
        Cmono => Cs400,
        C420jpeg | C420paldv | C420mpeg2 | C420 | C420p10 | C420p12 => Cs420,
        C422 | C422p10 | C422p12 => Cs422,
        C444 | C444p10 | C444p12 => Cs444,
    }
}

impl<R: Read + Send + Sync> Decoder for y4m::Decoder<R> {
    fn get_video_details(&self) -> VideoDetails {
        let width = self.get_width();
        let height = self.get_height();
        let color_space = self.get_colorspace();
        let bit_depth = color_space.get_bit_depth();
        let chroma_sampling = map_y4m_color_space(color_space);
        let framerate = self.get_framerate();
        let time_base = Rational::new(framerate.den as u64, framerate.num as u64);

        VideoDetails {
            width,
            height,
            bit_depth,
            chroma_sampling,
            time_base,
        }
    }

    fn read_video_frame<T: Pixel>(&mut self) -> Option<FrameInfo<T>> {
        let bit_depth = self.get_bit_depth();
        let color_space = self.get_colorspace();
        let chroma_sampling = map_y4m_color_space(color_space);
        let width = self.get_width();
        let height = self.get_height();
        let bytes = self.get_bytes_per_sample();
        self.read_frame()
            .map(|frame| {
                let mut f: FrameInfo<T> = FrameInfo::new(width, height, bit_depth, chroma_sampling);

                let (chroma_width, _) = chroma_sampling.get_chroma_dimensions(width, height);
                f.planes[0].copy_from_raw_u8(frame.get_y_plane(), width * bytes, bytes);
                if chroma_sampling != ChromaSampling::Cs400 {
                    f.planes[1].copy_from_raw_u8(frame.get_u_plane(), chroma_width * bytes, bytes);
                    f.planes[2].copy_from_raw_u8(frame.get_v_plane(), chroma_width * bytes, bytes);
                }

                f
            })
            .ok()
    }

    fn get_bit_depth(&self) -> usize {
        self.get_bit_depth()
    }
}
