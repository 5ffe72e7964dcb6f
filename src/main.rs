use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
    time::Instant,
};

use pcm_convert::{
    audio::{DecodedStream, PcmSource, convert::trig, open_path, wav},
    common::{AnyResult, banner, logger},
    configs::Config,
    log_println,
};
use tracing::{error, info, warn};

fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    logger::init(&config);
    banner::print_banner(&banner::BannerInfo::default());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [input, output] = args.as_slice() else {
        log_println!("usage: pcm-convert <input> <output.wav>");
        std::process::exit(2);
    };

    if let Err(e) = run(&config, Path::new(input), Path::new(output)) {
        error!("Conversion failed: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &Config, input: &Path, output: &Path) -> AnyResult<()> {
    let started = Instant::now();
    let target_rate = config.output.sample_rate;

    let opened = open_path(input)?;
    if opened.is_empty() {
        warn!("{} carries no audio frames", input.display());
    }

    trig::warm_up();
    let mut stream = DecodedStream::open(opened.source, opened.len, opened.format, target_rate)?;
    let source = stream.source_format();
    info!(
        "Converting {} ({} Hz, {} ch, {}-bit) -> {} ({} Hz stereo16, {} bytes)",
        input.display(),
        source.sample_rate,
        source.channels,
        source.bits_per_sample,
        output.display(),
        target_rate,
        stream.len()
    );

    let data_len = u32::try_from(stream.len())
        .map_err(|_| format!("output of {} bytes exceeds the WAV size limit", stream.len()))?;

    let mut writer = BufWriter::new(File::create(output)?);
    wav::write_header(&mut writer, stream.output_format(), data_len)?;

    let mut written = 0u64;
    if !stream.is_empty() {
        let mut buf = vec![0u8; 64 * 1024];
        loop {
            let n = stream.read(&mut buf)?;
            if n == 0 {
                break;
            }
            writer.write_all(&buf[..n])?;
            written += n as u64;
        }
    }
    writer.flush()?;
    stream.close()?;

    if written != stream.len() {
        error!("Short conversion: wrote {} of {} bytes", written, stream.len());
    }
    info!("Wrote {} bytes in {:.2?}", written, started.elapsed());
    Ok(())
}
