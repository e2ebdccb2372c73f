use av_remap::video::decode::Decoder;
use av_remap::video::remap::{Layout, RemapConfig, Remapper, StereoFormat};
use av_remap::video::{ChromaSampling, FrameInfo, Pixel};
use clap::{App, Arg};
use console::style;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::process::exit;
use std::str::FromStr;

fn main() {
    let cli = App::new("AV Remap")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::with_name("INPUT")
                .help("The input file to remap--currently supports Y4M files")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("OUTPUT")
                .help("The remapped output file--written as Y4M")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::with_name("INPUT_LAYOUT")
                .help("Layout of the input frames")
                .long("input-layout")
                .takes_value(true)
                .possible_values(&Layout::NAMES[..8])
                .default_value("cubemap"),
        )
        .arg(
            Arg::with_name("OUTPUT_LAYOUT")
                .help("Layout of the output frames")
                .long("output-layout")
                .takes_value(true)
                .possible_values(&Layout::NAMES)
                .default_value("cubemap_32"),
        )
        .arg(
            Arg::with_name("WIDTH")
                .help("Output width in pixels--defaults to the input width")
                .long("width")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("HEIGHT")
                .help("Output height in pixels--defaults to the input height")
                .long("height")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("YAW")
                .help("View rotation around the vertical axis, in degrees")
                .long("yaw")
                .takes_value(true)
                .default_value("0"),
        )
        .arg(
            Arg::with_name("PITCH")
                .help("View rotation around the horizontal axis, in degrees")
                .long("pitch")
                .takes_value(true)
                .default_value("0"),
        )
        .arg(
            Arg::with_name("HFOV")
                .help("Horizontal field of view of the flat_fixed viewport, in degrees")
                .long("hfov")
                .takes_value(true)
                .default_value("90"),
        )
        .arg(
            Arg::with_name("VFOV")
                .help("Vertical field of view of the flat_fixed viewport, in degrees")
                .long("vfov")
                .takes_value(true)
                .default_value("90"),
        )
        .arg(
            Arg::with_name("EXPAND_COEF")
                .help("Cube face expansion coefficient")
                .long("expand-coef")
                .takes_value(true)
                .default_value("1.0"),
        )
        .arg(
            Arg::with_name("W_SUBDIVISIONS")
                .help("Horizontal super-sampling factor per output pixel")
                .long("w-subdivisions")
                .takes_value(true)
                .default_value("1"),
        )
        .arg(
            Arg::with_name("H_SUBDIVISIONS")
                .help("Vertical super-sampling factor per output pixel")
                .long("h-subdivisions")
                .takes_value(true)
                .default_value("1"),
        )
        .arg(
            Arg::with_name("STEREO")
                .help("Eye packing of the input frames")
                .long("stereo")
                .takes_value(true)
                .possible_values(&StereoFormat::NAMES)
                .default_value("mono"),
        )
        .arg(
            Arg::with_name("VFLIP")
                .help("The right eye is stored vertically flipped inside its half")
                .long("vflip")
                .takes_value(false),
        )
        .get_matches();

    let config = RemapConfig {
        input_layout: parse_or_exit::<Layout>(cli.value_of("INPUT_LAYOUT").unwrap()),
        output_layout: parse_or_exit::<Layout>(cli.value_of("OUTPUT_LAYOUT").unwrap()),
        yaw: parse_or_exit::<f64>(cli.value_of("YAW").unwrap()),
        pitch: parse_or_exit::<f64>(cli.value_of("PITCH").unwrap()),
        hfov: parse_or_exit::<f64>(cli.value_of("HFOV").unwrap()),
        vfov: parse_or_exit::<f64>(cli.value_of("VFOV").unwrap()),
        expand_coef: parse_or_exit::<f64>(cli.value_of("EXPAND_COEF").unwrap()),
        w_subdivisions: parse_or_exit::<u32>(cli.value_of("W_SUBDIVISIONS").unwrap()),
        h_subdivisions: parse_or_exit::<u32>(cli.value_of("H_SUBDIVISIONS").unwrap()),
        stereo: parse_or_exit::<StereoFormat>(cli.value_of("STEREO").unwrap()),
        vflip: cli.is_present("VFLIP"),
        ..Default::default()
    };

    let input = cli.value_of("INPUT").unwrap();
    let output = cli.value_of("OUTPUT").unwrap();
    let file = File::open(input).unwrap_or_else(|e| {
        eprintln!("{} {}: {}", style("Could not open").red(), input, e);
        exit(1);
    });
    let mut decoder = y4m::Decoder::new(BufReader::new(file)).unwrap_or_else(|e| {
        eprintln!("{} {}: {:?}", style("Could not parse").red(), input, e);
        exit(1);
    });
    let details = decoder.get_video_details();

    let out_width = cli
        .value_of("WIDTH")
        .map(parse_or_exit::<usize>)
        .unwrap_or(details.width);
    let out_height = cli
        .value_of("HEIGHT")
        .map(parse_or_exit::<usize>)
        .unwrap_or(details.height);
    let remapper = Remapper::new(config, out_width, out_height).unwrap_or_else(|e| {
        eprintln!("{} {}", style("Invalid configuration:").red(), e);
        exit(1);
    });

    let sink = File::create(output).unwrap_or_else(|e| {
        eprintln!("{} {}: {}", style("Could not create").red(), output, e);
        exit(1);
    });
    let mut sink = BufWriter::new(sink);

    let frames = if details.bit_depth <= 8 {
        run_remap::<_, _, u8>(&mut decoder, &mut sink, remapper)
    } else {
        run_remap::<_, _, u16>(&mut decoder, &mut sink, remapper)
    };
    match frames {
        Ok(frames) => {
            println!(
                "{} {} frames to {}",
                style("Remapped").green(),
                frames,
                output
            );
        }
        Err(e) => {
            eprintln!("{} {}", style("Remap failed:").red(), e);
            exit(1);
        }
    }
}

fn parse_or_exit<T: FromStr>(value: &str) -> T
where
    T::Err: std::fmt::Display,
{
    value.parse().unwrap_or_else(|e| {
        eprintln!("{} {}: {}", style("Invalid option value").red(), value, e);
        exit(1);
    })
}

fn run_remap<R: std::io::Read + Send + Sync, W: Write, T: Pixel>(
    decoder: &mut y4m::Decoder<R>,
    sink: &mut W,
    mut remapper: Remapper,
) -> Result<u64, Box<dyn std::error::Error>> {
    let details = decoder.get_video_details();
    let bytes = if details.bit_depth <= 8 { 1 } else { 2 };
    let colorspace = decoder.get_colorspace();
    let framerate = decoder.get_framerate();
    let mut encoder = y4m::encode(remapper.out_width(), remapper.out_height(), framerate)
        .with_colorspace(colorspace)
        .write_header(sink)
        .map_err(|e| format!("could not write the y4m header: {:?}", e))?;

    let mut frames = 0u64;
    while let Some(frame) = decoder.read_video_frame::<T>() {
        let remapped = remapper.remap_frame(&frame)?;
        write_y4m_frame(&mut encoder, &remapped, bytes)
            .map_err(|e| format!("could not write frame {}: {:?}", frames, e))?;
        frames += 1;
    }
    Ok(frames)
}

fn write_y4m_frame<W: Write, T: Pixel>(
    encoder: &mut y4m::Encoder<W>,
    frame: &FrameInfo<T>,
    bytes: usize,
) -> Result<(), y4m::Error> {
    let y = frame.planes[0].to_raw_u8(bytes);
    let (u, v) = if frame.chroma_sampling == ChromaSampling::Cs400 {
        (Vec::new(), Vec::new())
    } else {
        (
            frame.planes[1].to_raw_u8(bytes),
            frame.planes[2].to_raw_u8(bytes),
        )
    };
    encoder.write_frame(&y4m::Frame::new([&y[..], &u[..], &v[..]], None))
}
