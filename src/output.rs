use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::cli::{DumpArgs, DumpFormat};
use crate::config::SeedConfig;
use crate::error::Error;

/// Writes words to stdout or a file in the specified format.
pub fn write_output(
    words: &[u32],
    format: DumpFormat,
    output_file: Option<&Path>,
) -> Result<(), Error> {
    match output_file {
        Some(path) => {
            let f = File::create(path).map_err(|e| Error::file(path, e))?;
            let mut out = BufWriter::new(f);
            format_output(words, format, &mut out)?;
            out.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            format_output(words, format, &mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn le_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

fn format_output(words: &[u32], format: DumpFormat, out: &mut dyn Write) -> io::Result<()> {
    match format {
        DumpFormat::Hex => {
            for w in words {
                writeln!(out, "{:08x}", w)?;
            }
        }
        DumpFormat::Raw => {
            out.write_all(&le_bytes(words))?;
        }
        DumpFormat::Base64 => {
            writeln!(out, "{}", STANDARD.encode(le_bytes(words)))?;
        }
        DumpFormat::Binary => {
            for w in words {
                writeln!(out, "{:032b}", w)?;
            }
        }
        DumpFormat::Decimal => {
            for w in words {
                writeln!(out, "{}", w)?;
            }
        }
    }
    Ok(())
}

/// Draw `args.count` words from the chosen generator and write them out.
pub fn run_dump(args: &DumpArgs, seeds: &SeedConfig) -> Result<(), Error> {
    let seed = args.seed.unwrap_or_else(|| seeds.for_kind(args.generator));
    let mut source = args.generator.build(seed);

    let mut words = vec![0u32; args.count];
    source.fill(&mut words);
    log::info!(
        "dumping {} words from {} (seed {})",
        args.count,
        args.generator.name(),
        seed
    );

    write_output(&words, args.format, args.output_file.as_deref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::words_from_le_bytes;
    use crate::generators::GeneratorKind;
    use crate::logging::LogArgs;

    fn format_to_string(words: &[u32], fmt: DumpFormat) -> String {
        let mut buf = Vec::new();
        format_output(words, fmt, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_hex() {
        let out = format_to_string(&[0xdeadbeef, 0x1], DumpFormat::Hex);
        assert_eq!(out, "deadbeef\n00000001\n");
    }

    #[test]
    fn test_raw_little_endian() {
        let mut buf = Vec::new();
        format_output(&[0x0403_0201], DumpFormat::Raw, &mut buf).unwrap();
        assert_eq!(buf, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_base64() {
        // LE bytes 00 01 02 00
        let out = format_to_string(&[0x0002_0100], DumpFormat::Base64);
        assert_eq!(out, "AAECAA==\n");
    }

    #[test]
    fn test_binary() {
        let out = format_to_string(&[0x8000_0001], DumpFormat::Binary);
        assert_eq!(out, "10000000000000000000000000000001\n");
    }

    #[test]
    fn test_decimal() {
        let out = format_to_string(&[0, u32::MAX], DumpFormat::Decimal);
        assert_eq!(out, "0\n4294967295\n");
    }

    #[test]
    fn test_dump_raw_round_trips_through_decoder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lcg.bin");
        let args = DumpArgs {
            generator: GeneratorKind::Lcg,
            seed: None,
            count: 3,
            format: DumpFormat::Raw,
            output_file: Some(path.clone()),
            config_file: None,
            log: LogArgs {
                log_level: None,
                log_file: None,
            },
        };
        run_dump(&args, &SeedConfig::default()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let (words, leftover) = words_from_le_bytes(&bytes);
        assert_eq!(leftover, 0);
        assert_eq!(words, vec![3_067_928_073, 889_114_580, 3_219_257_635]);
    }
}
