//! Binary and human-readable dumps of a [`CacheImage`], matching the bit
//! layout an RTL test harness loads tag/data SRAMs from, plus the inverse
//! parsers needed to round-trip a dump back into a [`CacheImage`].

use std::fs;
use std::path::Path;

use crate::cache::params::{CacheBlock, CacheImage, CacheParams, CohStatus};
use crate::common::error::TidalSimError;

fn tag_hex_chars(params: &CacheParams) -> u32 {
    params.tag_bits.div_ceil(4)
}

fn tag_array_binary_line(block: &CacheBlock, params: &CacheParams) -> String {
    let tag = block.tag & params.tag_mask;
    let coherency_mask = (1u64 << params.coherency_bits) - 1;
    let coherency = u64::from(block.coherency.bits()) & coherency_mask;
    let tag_array_data = (coherency << params.tag_bits) | tag;
    let width = (params.tag_bits + params.coherency_bits) as usize;
    format!("{tag_array_data:0width$b}")
}

/// Writes the per-way tag-array binary dumps (`{prefix}tag_array{way}.bin`)
/// and a pretty dump (`{prefix}tag_array.pretty`) into `dir`.
///
/// # Errors
///
/// Returns [`TidalSimError::Io`] if writing any file fails.
pub fn dump_tag_arrays(image: &CacheImage, dir: &Path, prefix: &str) -> Result<(), TidalSimError> {
    for way_idx in 0..image.params.n_ways {
        let lines: Vec<String> = (0..image.params.n_sets as usize)
            .map(|set_idx| tag_array_binary_line(image.block(way_idx, set_idx), &image.params))
            .collect();
        fs::write(dir.join(format!("{prefix}tag_array{way_idx}.bin")), lines.join("\n"))?;
    }
    fs::write(dir.join(format!("{prefix}tag_array.pretty")), tag_array_pretty_str(image))?;
    Ok(())
}

fn tag_array_pretty_str(image: &CacheImage) -> String {
    let params = &image.params;
    let chars = tag_hex_chars(params) as usize;
    let mut out = String::new();
    out.push_str(&format!(
        "Ways: {}",
        (0..params.n_ways)
            .rev()
            .map(|i| format!("Way {i}"))
            .collect::<Vec<_>>()
            .join(", ")
    ));
    for set_idx in 0..params.n_sets as usize {
        let blocks: Vec<String> = (0..params.n_ways)
            .rev()
            .map(|way_idx| {
                let block = image.block(way_idx, set_idx);
                format!(
                    "{:#0width$x} {}",
                    block.tag,
                    block.coherency.name(),
                    width = chars + 2
                )
            })
            .collect();
        out.push_str(&format!("\nSet {set_idx:02}: [{}]", blocks.join(", ")));
    }
    out
}

/// Writes the per-lane data-array binary dumps (`{prefix}data_array{way *
/// data_bus_bytes + lane}.bin`) and a pretty dump (`{prefix}data_array.pretty`)
/// into `dir`.
///
/// # Errors
///
/// Returns [`TidalSimError::Io`] if writing any file fails.
pub fn dump_data_arrays(image: &CacheImage, dir: &Path, prefix: &str) -> Result<(), TidalSimError> {
    let params = &image.params;
    let bus = params.data_bus_bytes as usize;
    let rows_per_set = params.rows_per_set as usize;

    for way_idx in 0..params.n_ways {
        let mut lanes: Vec<Vec<String>> = vec![Vec::new(); bus];
        for set_idx in 0..params.n_sets as usize {
            let data = &image.block(way_idx, set_idx).data;
            for row in 0..rows_per_set {
                for lane in 0..bus {
                    let byte = data[row * bus + lane];
                    lanes[lane].push(format!("{byte:08b}"));
                }
            }
        }
        for (lane, lines) in lanes.into_iter().enumerate() {
            let file_idx = way_idx * bus + lane;
            fs::write(dir.join(format!("{prefix}data_array{file_idx}.bin")), lines.join("\n"))?;
        }
    }
    fs::write(dir.join(format!("{prefix}data_array.pretty")), data_array_pretty_str(image))?;
    Ok(())
}

fn data_array_pretty_str(image: &CacheImage) -> String {
    let params = &image.params;
    let hex_chars = (params.block_size_bytes * 2) as usize;
    let mut out = String::new();
    out.push_str(&format!(
        "Ways: {}",
        (0..params.n_ways)
            .rev()
            .map(|i| format!("Way {i}"))
            .collect::<Vec<_>>()
            .join(", ")
    ));
    for set_idx in 0..params.n_sets as usize {
        let blocks: Vec<String> = (0..params.n_ways)
            .rev()
            .map(|way_idx| {
                let data = &image.block(way_idx, set_idx).data;
                let mut hex = String::with_capacity(hex_chars + 2);
                hex.push_str("0x");
                for byte in data.iter().rev() {
                    hex.push_str(&format!("{byte:02x}"));
                }
                hex
            })
            .collect();
        out.push_str(&format!("\nSet {set_idx:02}: [\n{}\n]", blocks.join("\n")));
    }
    out
}

/// Writes both the tag and data array dumps for `image` into `dir`.
///
/// # Errors
///
/// Returns [`TidalSimError::Io`] if writing any file fails.
pub fn dump(image: &CacheImage, dir: &Path, prefix: &str) -> Result<(), TidalSimError> {
    dump_tag_arrays(image, dir, prefix)?;
    dump_data_arrays(image, dir, prefix)?;
    Ok(())
}

fn read_binary_lines(path: &Path) -> Result<Vec<String>, TidalSimError> {
    let content = fs::read_to_string(path)?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Reconstructs tag and coherency state from the per-way tag-array dumps
/// written by [`dump_tag_arrays`].
///
/// # Errors
///
/// Returns [`TidalSimError::Io`] if a dump file is missing, or
/// [`TidalSimError::InvariantViolation`] if a dump has the wrong line count.
pub fn parse_tag_arrays(
    dir: &Path,
    prefix: &str,
    params: &CacheParams,
) -> Result<Vec<Vec<(u64, CohStatus)>>, TidalSimError> {
    let mut by_way = Vec::with_capacity(params.n_ways);
    for way_idx in 0..params.n_ways {
        let lines = read_binary_lines(&dir.join(format!("{prefix}tag_array{way_idx}.bin")))?;
        if lines.len() != params.n_sets as usize {
            return Err(TidalSimError::InvariantViolation {
                context: format!("tag array dump for way {way_idx} has wrong line count"),
                expected: params.n_sets as usize,
                actual: lines.len(),
            });
        }
        let mut sets = Vec::with_capacity(lines.len());
        for line in lines {
            let value = u64::from_str_radix(&line, 2).map_err(|_| TidalSimError::MalformedLog {
                line_no: 0,
                text: line.clone(),
            })?;
            let tag = value & params.tag_mask;
            let coherency_bits = (value >> params.tag_bits) & ((1 << params.coherency_bits) - 1);
            let coherency = match coherency_bits {
                0 => CohStatus::Nothing,
                1 => CohStatus::Branch,
                2 => CohStatus::Trunk,
                _ => CohStatus::Dirty,
            };
            sets.push((tag, coherency));
        }
        by_way.push(sets);
    }
    Ok(by_way)
}

/// Reconstructs block data from the per-lane data-array dumps written by
/// [`dump_data_arrays`].
///
/// # Errors
///
/// Returns [`TidalSimError::Io`] if a dump file is missing, or
/// [`TidalSimError::InvariantViolation`] if a dump has the wrong line count.
pub fn parse_data_arrays(
    dir: &Path,
    prefix: &str,
    params: &CacheParams,
) -> Result<Vec<Vec<Vec<u8>>>, TidalSimError> {
    let bus = params.data_bus_bytes as usize;
    let rows_per_set = params.rows_per_set as usize;
    let n_sets = params.n_sets as usize;

    let mut by_way = Vec::with_capacity(params.n_ways);
    for way_idx in 0..params.n_ways {
        let mut lanes = Vec::with_capacity(bus);
        for lane in 0..bus {
            let file_idx = way_idx * bus + lane;
            let lines = read_binary_lines(&dir.join(format!("{prefix}data_array{file_idx}.bin")))?;
            if lines.len() != n_sets * rows_per_set {
                return Err(TidalSimError::InvariantViolation {
                    context: format!("data array dump for lane {file_idx} has wrong line count"),
                    expected: n_sets * rows_per_set,
                    actual: lines.len(),
                });
            }
            lanes.push(lines);
        }

        let mut sets = Vec::with_capacity(n_sets);
        for set_idx in 0..n_sets {
            let mut data = vec![0u8; params.block_size_bytes as usize];
            for row in 0..rows_per_set {
                for (lane, lines) in lanes.iter().enumerate() {
                    let line = &lines[set_idx * rows_per_set + row];
                    let byte = u8::from_str_radix(line, 2).map_err(|_| TidalSimError::MalformedLog {
                        line_no: 0,
                        text: line.clone(),
                    })?;
                    data[row * bus + lane] = byte;
                }
            }
            sets.push(data);
        }
        by_way.push(sets);
    }
    Ok(by_way)
}

/// Reconstructs a full [`CacheImage`] from the dumps written by [`dump`].
///
/// # Errors
///
/// Propagates any error from [`parse_tag_arrays`] or [`parse_data_arrays`].
pub fn parse(dir: &Path, prefix: &str, params: CacheParams) -> Result<CacheImage, TidalSimError> {
    let tags = parse_tag_arrays(dir, prefix, &params)?;
    let data = parse_data_arrays(dir, prefix, &params)?;
    let mut image = CacheImage::new(params);
    for way_idx in 0..image.params.n_ways {
        for set_idx in 0..image.params.n_sets as usize {
            let (tag, coherency) = tags[way_idx][set_idx];
            image.array[way_idx][set_idx] = CacheBlock {
                data: data[way_idx][set_idx].clone(),
                tag,
                coherency,
            };
        }
    }
    Ok(image)
}
