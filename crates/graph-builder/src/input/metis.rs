use std::{convert::TryFrom, fs::File, marker::PhantomData, path::Path};

use crate::{
    graph::csr::{sort_and_deduplicate_targets, sort_targets, Csr, CsrLayout, NodeValues, Target},
    index::Idx,
    Error, UndirectedCsrGraph,
};

use super::{InputCapabilities, InputPath};

/// Reads an undirected, edge-weighted graph from a METIS graph file.
///
/// The file starts with a header line `n m fmt ncon`, followed by `n` lines,
/// one per vertex, listing its neighbors as 1-based ids. `fmt` selects
/// whether a weight follows each neighbor id (`1`) or edges are unweighted
/// (`0`). `ncon`, the number of vertex weights per line, must be `0` --
/// vertex-weighted input is not supported and every vertex is assigned a
/// uniform weight of `1`. Lines starting with `%` are comments.
pub struct MetisInput<NI: Idx> {
    _idx: PhantomData<NI>,
}

impl<NI: Idx> Default for MetisInput<NI> {
    fn default() -> Self {
        Self { _idx: PhantomData }
    }
}

impl<NI: Idx> InputCapabilities<NI> for MetisInput<NI> {
    type GraphInput = MetisGraph<NI>;
}

/// The parsed contents of a METIS graph file, not yet assembled into a
/// [`UndirectedCsrGraph`]`.
pub struct MetisGraph<NI: Idx> {
    row_map: Box<[NI]>,
    entries: Box<[Target<NI, i64>]>,
}

impl<NI, P> TryFrom<InputPath<P>> for MetisGraph<NI>
where
    P: AsRef<Path>,
    NI: Idx,
{
    type Error = Error;

    fn try_from(path: InputPath<P>) -> Result<Self, Self::Error> {
        let file = File::open(path.0.as_ref())?;
        let mmap = unsafe { memmap2::MmapOptions::new().populate().map(&file)? };
        MetisGraph::try_from(mmap.as_ref())
    }
}

fn non_comment_lines(bytes: &[u8]) -> impl Iterator<Item = &str> {
    bytes
        .split(|&b| b == b'\n')
        .map(|line| std::str::from_utf8(line).unwrap_or("").trim())
        .filter(|line| !line.starts_with('%'))
}

fn parse_header_field(
    fields: &mut std::str::SplitAsciiWhitespace<'_>,
    name: &str,
) -> Result<usize, Error> {
    let field = fields.next().ok_or_else(|| Error::InvalidMetisHeader {
        detail: format!("missing {name}"),
    })?;
    field.parse().map_err(|_| Error::InvalidMetisHeader {
        detail: format!("{name} is not a number: {field:?}"),
    })
}

impl<NI: Idx> TryFrom<&[u8]> for MetisGraph<NI> {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let mut lines = non_comment_lines(bytes);

        let header = lines.next().ok_or_else(|| Error::InvalidMetisHeader {
            detail: "missing header line".to_string(),
        })?;
        let mut header_fields = header.split_ascii_whitespace();
        let n = parse_header_field(&mut header_fields, "n")?;
        let m = parse_header_field(&mut header_fields, "m")?;
        let fmt = header_fields.next().map(str::parse::<usize>).transpose();
        let fmt = fmt
            .map_err(|_| Error::InvalidMetisHeader {
                detail: "fmt is not a number".to_string(),
            })?
            .unwrap_or(0);
        let ncon = header_fields.next().map(str::parse::<usize>).transpose();
        let ncon = ncon
            .map_err(|_| Error::InvalidMetisHeader {
                detail: "ncon is not a number".to_string(),
            })?
            .unwrap_or(0);

        if fmt != 0 && fmt != 1 {
            return Err(Error::InvalidMetisHeader {
                detail: format!("unsupported format flag {fmt}"),
            });
        }
        if ncon != 0 {
            return Err(Error::InvalidMetisHeader {
                detail: format!("unsupported ncon {ncon}, vertex weights are not supported"),
            });
        }
        let has_ew = fmt == 1;

        let mut row_map = Vec::with_capacity(n + 1);
        row_map.push(NI::zero());
        let mut entries = Vec::with_capacity(m * 2);

        let mut rows_read = 0_usize;
        for line in lines {
            if rows_read >= n {
                break;
            }

            let mut fields = line.split_ascii_whitespace();
            loop {
                let target = match fields.next() {
                    Some(field) => field,
                    None => break,
                };
                let target: usize = target.parse().map_err(|_| Error::InvalidMetisHeader {
                    detail: format!("non-numeric neighbor id {target:?}"),
                })?;
                let value: i64 = if has_ew {
                    let value = fields.next().ok_or_else(|| Error::InvalidMetisHeader {
                        detail: "missing edge weight".to_string(),
                    })?;
                    value.parse().map_err(|_| Error::InvalidMetisHeader {
                        detail: format!("non-numeric edge weight {value:?}"),
                    })?
                } else {
                    1
                };
                entries.push(Target::new(NI::new(target - 1), value));
            }

            rows_read += 1;
            row_map.push(NI::new(entries.len()));
        }

        if rows_read != n || entries.len() != 2 * m {
            return Err(Error::MetisCountMismatch {
                expected: usize::max(n, 2 * m),
                actual: usize::max(rows_read, entries.len()),
            });
        }

        Ok(MetisGraph {
            row_map: row_map.into_boxed_slice(),
            entries: entries.into_boxed_slice(),
        })
    }
}

impl<NI: Idx> TryFrom<(MetisGraph<NI>, CsrLayout)> for UndirectedCsrGraph<NI, i64, i64> {
    type Error = Error;

    fn try_from((graph, csr_layout): (MetisGraph<NI>, CsrLayout)) -> Result<Self, Self::Error> {
        let MetisGraph { row_map, entries } = graph;
        let node_count = row_map.len() - 1;

        let row_map = row_map.into_vec();
        let mut entries = entries.into_vec();

        let (row_map, entries) = match csr_layout {
            CsrLayout::Unsorted => (row_map, entries),
            CsrLayout::Sorted => {
                sort_targets(&row_map, &mut entries);
                (row_map, entries)
            }
            CsrLayout::Deduplicated => sort_and_deduplicate_targets(&row_map, &mut entries[..]),
        };

        let csr = Csr::new(row_map.into_boxed_slice(), entries.into_boxed_slice());
        let node_values = NodeValues::new(vec![1_i64; node_count]);

        Ok(UndirectedCsrGraph::new(node_values, csr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Graph;

    #[test]
    fn parses_unweighted_metis_graph() {
        let bytes = b"4 5 0 0\n2 3\n1 3 4\n1 2 4\n2 3\n";
        let graph = MetisGraph::<usize>::try_from(bytes.as_slice()).unwrap();
        assert_eq!(graph.row_map.as_ref(), &[0_usize, 2, 5, 8, 10]);
        assert_eq!(graph.entries.len(), 10);
    }

    #[test]
    fn parses_weighted_metis_graph() {
        let bytes = b"3 2 1 0\n2 5 3 7\n1 5 3 2\n2 7\n";
        let graph = MetisGraph::<usize>::try_from(bytes.as_slice()).unwrap();
        assert_eq!(graph.row_map.as_ref(), &[0_usize, 2, 4, 5]);
        assert_eq!(graph.entries[0].target, 1);
        assert_eq!(graph.entries[0].value, 5);
    }

    #[test]
    fn rejects_ncon() {
        let bytes = b"2 1 0 1\n1 2 1\n2 1\n";
        let err = MetisGraph::<usize>::try_from(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, Error::InvalidMetisHeader { .. }));
    }

    #[test]
    fn rejects_count_mismatch() {
        let bytes = b"3 2 0 0\n2\n1\n";
        let err = MetisGraph::<usize>::try_from(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, Error::MetisCountMismatch { .. }));
    }

    #[test]
    fn builds_undirected_graph() {
        let bytes = b"4 5 0 0\n2 3\n1 3 4\n1 2 4\n2 3\n";
        let graph = MetisGraph::<usize>::try_from(bytes.as_slice()).unwrap();
        let g = UndirectedCsrGraph::<usize, i64, i64>::try_from((graph, CsrLayout::Sorted))
            .unwrap();
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 5);
    }
}
