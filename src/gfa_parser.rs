/// Minimal text GFA reader and writer.
///
/// Supports the S/L/P records the sorter needs. Segment names are kept
/// as external node ids: numeric names parse directly, any other name is
/// assigned the next free id.
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{SortError, SortResult};
use crate::graph::{BiPath, BidirectedGraph, Handle};

pub fn load_gfa(path: &Path) -> SortResult<BidirectedGraph> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut graph = BidirectedGraph::new();
    let mut name_to_id: HashMap<String, u64> = HashMap::new();
    let mut next_free_id = 1u64;

    // links and paths may reference segments that appear later, so they
    // are resolved after the whole file is read
    let mut pending_links: Vec<(String, bool, String, bool)> = Vec::new();
    let mut pending_paths: Vec<(String, String)> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('H') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        match fields[0] {
            "S" => {
                if fields.len() < 3 {
                    return Err(SortError::Gfa(format!("truncated S record: {}", line)));
                }
                let name = fields[1].to_string();
                let id = match name.parse::<u64>() {
                    Ok(id) => id,
                    Err(_) => {
                        let id = next_free_id;
                        next_free_id += 1;
                        id
                    }
                };
                next_free_id = next_free_id.max(id + 1);
                name_to_id.insert(name, id);
                graph.add_node(id, fields[2].as_bytes().to_vec());
            }
            "L" => {
                if fields.len() < 5 {
                    return Err(SortError::Gfa(format!("truncated L record: {}", line)));
                }
                pending_links.push((
                    fields[1].to_string(),
                    parse_orientation(fields[2])?,
                    fields[3].to_string(),
                    parse_orientation(fields[4])?,
                ));
            }
            "P" => {
                if fields.len() < 3 {
                    return Err(SortError::Gfa(format!("truncated P record: {}", line)));
                }
                pending_paths.push((fields[1].to_string(), fields[2].to_string()));
            }
            _ => {}
        }
    }

    let resolve = |name: &str,
                   reverse: bool,
                   name_to_id: &HashMap<String, u64>,
                   graph: &BidirectedGraph|
     -> SortResult<Handle> {
        let id = name_to_id
            .get(name)
            .ok_or_else(|| SortError::Gfa(format!("unknown segment: {}", name)))?;
        let handle = graph
            .handle_for_id(*id)
            .ok_or_else(|| SortError::Gfa(format!("unknown segment: {}", name)))?;
        Ok(if reverse { handle.flip() } else { handle })
    };

    for (from_name, from_reverse, to_name, to_reverse) in pending_links {
        let from = resolve(&from_name, from_reverse, &name_to_id, &graph)?;
        let to = resolve(&to_name, to_reverse, &name_to_id, &graph)?;
        graph.add_edge(from, to);
    }

    for (path_name, step_list) in pending_paths {
        let mut path = BiPath::new(path_name);
        for step in step_list.split(',') {
            let step = step.trim();
            if step.is_empty() {
                continue;
            }
            let (name, reverse) = match step.chars().last() {
                Some('+') => (&step[..step.len() - 1], false),
                Some('-') => (&step[..step.len() - 1], true),
                _ => {
                    return Err(SortError::Gfa(format!(
                        "path step without orientation: {}",
                        step
                    )))
                }
            };
            path.add_step(resolve(name, reverse, &name_to_id, &graph)?);
        }
        if !path.steps.is_empty() {
            graph.paths.push(path);
        }
    }

    log::debug!(
        "loaded {} nodes, {} edges, {} paths",
        graph.node_count(),
        graph.edges.len(),
        graph.paths.len()
    );
    Ok(graph)
}

fn parse_orientation(field: &str) -> SortResult<bool> {
    match field {
        "+" => Ok(false),
        "-" => Ok(true),
        other => Err(SortError::Gfa(format!("bad orientation: {}", other))),
    }
}

/// Write the graph back out, segments in traversal order.
pub fn write_gfa(graph: &BidirectedGraph, path: &Path) -> SortResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "H\tVN:Z:1.0")?;

    for handle in graph.handles() {
        let index = handle.node_index();
        writeln!(
            writer,
            "S\t{}\t{}",
            graph.node_id(index),
            String::from_utf8_lossy(graph.sequence(index))
        )?;
    }

    let mut edges = graph.edges.clone();
    edges.sort();
    for edge in edges {
        writeln!(
            writer,
            "L\t{}\t{}\t{}\t{}\t0M",
            graph.node_id(edge.from.node_index()),
            orientation_char(edge.from),
            graph.node_id(edge.to.node_index()),
            orientation_char(edge.to),
        )?;
    }

    for path in &graph.paths {
        let steps: Vec<String> = path
            .steps
            .iter()
            .map(|h| format!("{}{}", graph.node_id(h.node_index()), orientation_char(*h)))
            .collect();
        let overlaps = vec!["0M"; path.steps.len().saturating_sub(1)].join(",");
        writeln!(writer, "P\t{}\t{}\t{}", path.name, steps.join(","), overlaps)?;
    }

    writer.flush()?;
    Ok(())
}

fn orientation_char(handle: Handle) -> char {
    if handle.is_reverse() {
        '-'
    } else {
        '+'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_GFA: &str = "H\tVN:Z:1.0\n\
        S\t1\tACGT\n\
        S\t2\tGG\n\
        S\t3\tTTT\n\
        L\t1\t+\t2\t+\t0M\n\
        L\t2\t+\t3\t-\t0M\n\
        P\tp\t1+,2+,3-\t0M,0M\n";

    fn write_temp_gfa(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_segments_links_and_paths() {
        let file = write_temp_gfa(SMALL_GFA);
        let graph = load_gfa(file.path()).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.paths.len(), 1);
        assert_eq!(graph.paths[0].steps.len(), 3);
        assert!(graph.paths[0].steps[2].is_reverse());
        assert_eq!(graph.get_length(graph.handle_for_id(1).unwrap()), 4);
    }

    #[test]
    fn unknown_segment_in_link_is_an_error() {
        let file = write_temp_gfa("S\t1\tACGT\nL\t1\t+\t9\t+\t0M\n");
        let err = load_gfa(file.path()).unwrap_err();
        assert!(err.to_string().contains("unknown segment"));
    }

    #[test]
    fn roundtrip_preserves_structure() {
        let file = write_temp_gfa(SMALL_GFA);
        let graph = load_gfa(file.path()).unwrap();

        let out = tempfile::NamedTempFile::new().unwrap();
        write_gfa(&graph, out.path()).unwrap();
        let reloaded = load_gfa(out.path()).unwrap();

        assert_eq!(reloaded.node_count(), graph.node_count());
        assert_eq!(reloaded.edges.len(), graph.edges.len());
        assert_eq!(reloaded.paths.len(), graph.paths.len());
        assert_eq!(reloaded.paths[0].steps, graph.paths[0].steps);
    }
}
