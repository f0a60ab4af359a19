use pretty_assertions::assert_eq;
use tempfile::tempdir;
use tidalsim_core::bb::extract;
use tidalsim_core::cache::mtr::mtr_ckpts_from_inst_points;
use tidalsim_core::cache::serialize;
use tidalsim_core::checkpoint::cmd::{checkpoint_dirs, inst_points_dump};
use tidalsim_core::checkpoint::split_loadarch;
use tidalsim_core::embed::embed;
use tidalsim_core::trace::TraceParser;
use tidalsim_core::CacheParams;

fn plain_trace_lines() -> Vec<String> {
    [
        "core   0: 0x0000000080000000 (0x00004081) c.li    ra, 0",
        "core   0: 0x0000000080000002 (0x00004101) c.li    sp, 0",
        "core   0: 0x0000000080000004 (0x169010ef) jal     pc + 0x1968",
        "core   0: 0x0000000080001968 (0x00000013) nop",
        "core   0: 0x000000008000196c (0x00008067) ret",
        "core   0: 0x0000000080000008 (0x00004081) c.li    ra, 0",
        "core   0: 0x000000008000000a (0x00004101) c.li    sp, 0",
        "core   0: 0x000000008000000c (0x169010ef) jal     pc + 0x1968",
    ]
    .into_iter()
    .map(ToString::to_string)
    .collect()
}

/// Parsing a trace twice (once for extraction, once for embedding) and
/// running it through the pipeline produces embeddings whose total instret
/// equals the trace length, against a basic-block map built from the
/// identical trace.
#[test]
fn extraction_and_embedding_agree_on_total_instret() {
    let lines = plain_trace_lines();

    let bb_map = extract(TraceParser::new(lines.clone().into_iter(), false)).expect("extraction should succeed");
    assert!(bb_map.len() >= 2);

    let rows: Vec<_> = embed(TraceParser::new(lines.clone().into_iter(), false), &bb_map, 3)
        .expect("valid interval length")
        .collect::<Result<_, _>>()
        .expect("embedding should succeed");

    let total_instret: u64 = rows.iter().map(|r| r.instret).sum();
    assert_eq!(total_instret, lines.len() as u64);
    for row in &rows {
        assert_eq!(row.embedding.len(), bb_map.len());
    }
}

fn commit_log_lines() -> Vec<String> {
    [
        "core   0: 0x0000000080001a80 (0x0000e022) c.sdsp  s0, 0(sp)",
        "core   0: 3 0x0000000080001a80 (0xe022) mem 0x0000000080002000 0x0000000000000000",
        "core   0: 0x0000000080001a82 (0x8201b483) ld      s1, -2016(gp)",
        "core   0: 3 0x0000000080001a82 (0x8201b483) x9  0x0000000080001f50 mem 0x0000000080002040",
        "core   0: 0x0000000080001a86 (0x0000e022) c.sdsp  s0, 0(sp)",
        "core   0: 3 0x0000000080001a86 (0xe022) mem 0x00000000800020c0 0x0000000000000000",
    ]
    .into_iter()
    .map(ToString::to_string)
    .collect()
}

/// An MTR snapshot reconstructed into a cache image round-trips through the
/// tag/data array serializer: dumping and re-parsing yields the same image.
#[test]
fn mtr_snapshot_to_cache_image_round_trips_through_serialization() {
    let mut parser = TraceParser::new(commit_log_lines().into_iter(), true);
    let snapshots = mtr_ckpts_from_inst_points(&mut parser, 64, &[3]).expect("snapshotting should succeed");
    let mtr = &snapshots[0];
    assert_eq!(mtr.table.len(), 3);

    let params = CacheParams::new(32, 64, 4, 2).expect("valid geometry");
    let image = mtr
        .as_cache::<std::io::Cursor<Vec<u8>>>(&params, None, 0x8000_0000)
        .expect("reconstruction should succeed");

    let dir = tempdir().expect("tempdir should succeed");
    serialize::dump(&image, dir.path(), "ckpt_").expect("dump should succeed");
    let restored = serialize::parse(dir.path(), "ckpt_", params).expect("parse should succeed");

    for way in 0..params.n_ways {
        for set in 0..params.n_sets as usize {
            assert_eq!(image.block(way, set), restored.block(way, set));
        }
    }
}

/// A checkpoint plan's predicted line count matches a synthesized combined
/// log's actual line count, and splitting it produces one `loadarch` file
/// per checkpoint with the expected chunk size.
#[test]
fn checkpoint_plan_splits_a_matching_synthetic_log() {
    let base_dir = tempdir().expect("tempdir should succeed");
    let inst_points = vec![100u64, 200u64];
    let plan = inst_points_dump(0x8000_0000, &inst_points, 1, base_dir.path()).expect("increasing points");

    let combined_log = (0..plan.expected_lines)
        .map(|i| format!("line{i}"))
        .collect::<Vec<_>>()
        .join("\n");

    let dirs = checkpoint_dirs(base_dir.path(), 0x8000_0000, &inst_points);
    for dir in &dirs {
        std::fs::create_dir_all(dir).expect("checkpoint dir should be creatable");
    }

    split_loadarch(&combined_log, plan.expected_lines, &dirs).expect("split should succeed");

    let lines_per_chunk = plan.expected_lines / inst_points.len();
    for dir in &dirs {
        let content = std::fs::read_to_string(dir.join("loadarch")).expect("loadarch should exist");
        assert_eq!(content.lines().count(), lines_per_chunk);
    }
}
