//! Loading the input graph and configuration, and dumping/reimporting a
//! coarsening sequence for controlled-input replay (`SPEC_FULL.md` sections
//! 10.5/10.6/10.7), grounded in
//! `examples/original_source/src/io.hpp`/`binary_dump.hpp`.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use graph_builder::prelude::*;

use crate::coarsen::Level;
use crate::config::Config;
use crate::model::Gain;
use crate::Error;

/// Loads an undirected, edge-weighted graph from a METIS graph file,
/// returning it alongside its per-vertex weights. Vertex weights are
/// uniformly `1`, mirroring `MetisInput`'s documented `ncon = 0`
/// restriction.
pub fn load_metis_graph<P: AsRef<Path>>(
    path: P,
) -> Result<(UndirectedCsrGraph<u32, (), Gain>, Vec<Gain>), Error> {
    let metis_graph: UndirectedCsrGraph<u32, i64, i64> = GraphBuilder::new()
        .csr_layout(CsrLayout::Sorted)
        .file_format(MetisInput::default())
        .path(path)
        .build()?;

    let n = metis_graph.node_count();
    let vtx_w: Vec<Gain> = (0..n).map(|i| *metis_graph.node_value(i)).collect();

    // `MetisInput`'s dedicated builder impl is the only way to obtain a
    // graph with non-unit vertex values; vertex weights live in `vtx_w`
    // from here on, so the working graph is rebuilt with `NV = ()`.
    let mut edges: Vec<(u32, u32, Gain)> = Vec::with_capacity(metis_graph.edge_count());
    for u in 0..n {
        for target in metis_graph.neighbors_with_values(u) {
            if u <= target.target {
                edges.push((u, target.target, target.value));
            }
        }
    }

    let graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
        .csr_layout(CsrLayout::Sorted)
        .edges_with_values(edges)
        .build();

    Ok((graph, vtx_w))
}

/// Loads a [`Config`] from the 4-line configuration file format: one value
/// per line, in order `coarsening_alg`, `num_parts`, `num_iter`,
/// `max_imb_ratio`. Blank lines and lines starting with `#` are skipped.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut fields = Vec::with_capacity(4);
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        fields.push(line.to_string());
        if fields.len() == 4 {
            break;
        }
    }

    if fields.len() != 4 {
        return Err(Error::InvalidConfig {
            detail: format!("expected 4 config lines, found {}", fields.len()),
        });
    }

    let parse_usize = |s: &str, name: &str| -> Result<usize, Error> {
        s.parse().map_err(|_| Error::InvalidConfig {
            detail: format!("{name} is not a number: {s:?}"),
        })
    };
    let parse_f64 = |s: &str, name: &str| -> Result<f64, Error> {
        s.parse().map_err(|_| Error::InvalidConfig {
            detail: format!("{name} is not a number: {s:?}"),
        })
    };

    let coarsening_alg = parse_usize(&fields[0], "coarsening_alg")? as u8;
    let num_parts = parse_usize(&fields[1], "num_parts")?;
    let num_iter = parse_usize(&fields[2], "num_iter")?;
    let max_imb_ratio = parse_f64(&fields[3], "max_imb_ratio")?;

    Ok(Config::new(coarsening_alg, num_parts, num_iter, max_imb_ratio))
}

/// Writes a partition as a flat sequence of part ids, one per line, in
/// vertex-id order (mirrors `binary_dump.hpp`'s `dump_coarse_part`, but as
/// plain text since the partition output is meant to be consumed by other
/// tools).
pub fn write_part<P: AsRef<Path>>(path: P, part: &[i32]) -> Result<(), Error> {
    let mut file = File::create(path)?;
    let mut buf = String::with_capacity(part.len() * 2);
    for &p in part {
        buf.push_str(&p.to_string());
        buf.push('\n');
    }
    file.write_all(buf.as_bytes())?;
    Ok(())
}

/// Loads a partition written by [`write_part`].
pub fn load_part<P: AsRef<Path>>(path: P) -> Result<Vec<i32>, Error> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut part = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        part.push(line.parse().map_err(|_| Error::CoarseDumpFormat {
            detail: format!("non-numeric part id {line:?}"),
        })?);
    }
    Ok(part)
}

fn write_i64<W: Write>(w: &mut W, v: i64) -> std::io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn read_i64<R: Read>(r: &mut R) -> std::io::Result<i64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

/// Dumps the coarsening sequence in the finest-to-coarsest order, mirroring
/// `binary_dump.hpp`'s `dump_coarse`: level count, then per level the CSR
/// row offsets, edge targets, edge values, vertex weights, and (for every
/// level but the coarsest) the interpolation map into the next-coarser
/// level.
pub fn dump_coarse<P: AsRef<Path>>(path: P, levels: &[Level]) -> Result<(), Error> {
    let mut file = File::create(path)?;
    write_i64(&mut file, levels.len() as i64)?;

    for level in levels.iter().rev() {
        let n = level.graph.node_count();
        let m = level.graph.edge_count();
        write_i64(&mut file, n as i64)?;
        write_i64(&mut file, m as i64)?;

        let mut offset = 0i64;
        write_i64(&mut file, offset)?;
        for v in 0..n {
            offset += level.graph.degree(v) as i64;
            write_i64(&mut file, offset)?;
        }

        for v in 0..n {
            for target in level.graph.neighbors(v) {
                write_i64(&mut file, *target as i64)?;
            }
        }
        for v in 0..n {
            for target in level.graph.neighbors_with_values(v) {
                write_i64(&mut file, target.value)?;
            }
        }
        for v in 0..n {
            write_i64(&mut file, level.vtx_w[v as usize])?;
        }

        match &level.interp {
            Some(interp) => {
                write_i64(&mut file, interp.len() as i64)?;
                for &c in interp {
                    write_i64(&mut file, c as i64)?;
                }
            }
            None => {
                write_i64(&mut file, 0)?;
            }
        }
    }

    Ok(())
}

/// Reloads a dump written by [`dump_coarse`], finest level first -- the
/// shape [`crate::coarsen::coarsen`] itself returns.
pub fn load_coarse<P: AsRef<Path>>(path: P) -> Result<Vec<Level>, Error> {
    let mut file = File::open(path)?;
    let num_levels = read_i64(&mut file)? as usize;

    let mut coarse_first = Vec::with_capacity(num_levels);
    for _ in 0..num_levels {
        let n = read_i64(&mut file)? as usize;
        let m = read_i64(&mut file)? as usize;

        let mut offsets = Vec::with_capacity(n + 1);
        for _ in 0..=n {
            offsets.push(read_i64(&mut file)?);
        }

        let mut target_ids = Vec::with_capacity(2 * m);
        for _ in 0..2 * m {
            target_ids.push(read_i64(&mut file)? as u32);
        }
        let mut target_values = Vec::with_capacity(2 * m);
        for _ in 0..2 * m {
            target_values.push(read_i64(&mut file)?);
        }

        let mut edges: Vec<(u32, u32, Gain)> = Vec::with_capacity(m);
        for u in 0..n {
            let lo = offsets[u] as usize;
            let hi = offsets[u + 1] as usize;
            for idx in lo..hi {
                let v = target_ids[idx];
                if (u as u32) <= v {
                    edges.push((u as u32, v, target_values[idx]));
                }
            }
        }

        let mut vtx_w = Vec::with_capacity(n);
        for _ in 0..n {
            vtx_w.push(read_i64(&mut file)?);
        }

        let interp_len = read_i64(&mut file)? as usize;
        let interp = if interp_len == 0 {
            None
        } else {
            let mut interp = Vec::with_capacity(interp_len);
            for _ in 0..interp_len {
                interp.push(read_i64(&mut file)? as u32);
            }
            Some(interp)
        };

        let graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
            .csr_layout(CsrLayout::Sorted)
            .edges_with_values(edges)
            .build();

        coarse_first.push(Level { graph, vtx_w, interp });
    }

    coarse_first.reverse();
    Ok(coarse_first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn config_round_trip() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.txt");
        std::fs::write(&path, "1\n4\n3\n1.05\n").expect("write");

        let config = load_config(&path).expect("parses");
        assert_eq!(config.coarsening_alg, 1);
        assert_eq!(config.num_parts, 4);
        assert_eq!(config.num_iter, 3);
        assert_eq!(config.max_imb_ratio, 1.05);
    }

    #[test]
    fn part_round_trip() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("part.txt");
        let part = vec![0, 1, 1, 0, 2];
        write_part(&path, &part).expect("write");
        let loaded = load_part(&path).expect("read");
        assert_eq!(loaded, part);
    }

    #[test]
    fn coarse_dump_round_trip() {
        let edges: Vec<(u32, u32, Gain)> = vec![(0, 1, 1), (1, 2, 2), (2, 3, 3)];
        let graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
            .csr_layout(CsrLayout::Sorted)
            .edges_with_values(edges)
            .build();
        let levels = crate::coarsen::coarsen(graph, vec![1, 1, 1, 1], 2);

        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("coarse.bin");
        dump_coarse(&path, &levels).expect("dump");
        let reloaded = load_coarse(&path).expect("reload");

        assert_eq!(reloaded.len(), levels.len());
        for (a, b) in levels.iter().zip(reloaded.iter()) {
            assert_eq!(a.graph.node_count(), b.graph.node_count());
            assert_eq!(a.graph.edge_count(), b.graph.edge_count());
            assert_eq!(a.vtx_w, b.vtx_w);
            assert_eq!(a.interp.is_some(), b.interp.is_some());
        }
    }
}
