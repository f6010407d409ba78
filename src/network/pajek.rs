// Minimal Pajek .net support: *Vertices, *Edges/*Arcs and the list forms.
// Vertices are 1-based in the file and become 0-based ids here. Arcs are
// folded into undirected edges.

use super::Network;
use crate::agent::AgentId;
use crate::error::{GameError, Result};
use std::fmt::Write as _;
use std::path::Path;

enum Section {
    Preamble,
    Vertices,
    Pairs,
    Lists,
}

fn parse_error(line: usize, message: impl Into<String>) -> GameError {
    GameError::Pajek {
        line,
        message: message.into(),
    }
}

fn vertex(field: Option<&str>, count: usize, line: usize) -> Result<AgentId> {
    let field = field.ok_or_else(|| parse_error(line, "missing vertex number"))?;
    let number: usize = field
        .parse()
        .map_err(|_| parse_error(line, format!("bad vertex number {:?}", field)))?;
    if number == 0 || number > count {
        return Err(parse_error(
            line,
            format!("vertex {} outside 1..={}", number, count),
        ));
    }
    Ok((number - 1) as AgentId)
}

pub fn parse_pajek(text: &str) -> Result<Network> {
    let mut section = Section::Preamble;
    let mut network: Option<Network> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        if let Some(header) = line.strip_prefix('*') {
            let mut parts = header.split_whitespace();
            let keyword = parts.next().unwrap_or_default().to_lowercase();
            section = match keyword.as_str() {
                "network" => Section::Preamble,
                "vertices" => {
                    let count = parts
                        .next()
                        .and_then(|c| c.parse::<usize>().ok())
                        .ok_or_else(|| parse_error(line_no, "*Vertices needs a count"))?;
                    network = Some(Network::with_nodes(count));
                    Section::Vertices
                }
                "edges" | "arcs" => Section::Pairs,
                "edgeslist" | "arcslist" => Section::Lists,
                other => return Err(parse_error(line_no, format!("unknown section *{}", other))),
            };
            continue;
        }

        match section {
            Section::Preamble => {
                return Err(parse_error(line_no, "data before *Vertices"));
            }
            // labels and coordinates carry nothing we use
            Section::Vertices => {}
            Section::Pairs | Section::Lists => {
                let network = network
                    .as_mut()
                    .ok_or_else(|| parse_error(line_no, "edges before *Vertices"))?;
                let count = network.node_count();
                let mut fields = line.split_whitespace();
                let source = vertex(fields.next(), count, line_no)?;

                if let Section::Pairs = section {
                    // an optional weight may follow, it is ignored
                    let target = vertex(fields.next(), count, line_no)?;
                    network.add_edge(source, target);
                } else {
                    for field in fields {
                        let target = vertex(Some(field), count, line_no)?;
                        network.add_edge(source, target);
                    }
                }
            }
        }
    }

    network.ok_or_else(|| parse_error(0, "missing *Vertices section"))
}

pub fn read_pajek(path: impl AsRef<Path>) -> Result<Network> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| GameError::io(path, e))?;
    parse_pajek(&text)
}

pub fn to_pajek(network: &Network) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "*Vertices {}", network.node_count());
    for id in 0..network.node_count() {
        let _ = writeln!(out, "{} \"{}\"", id + 1, id);
    }
    let _ = writeln!(out, "*Edges");
    for &(a, b) in network.edges() {
        let _ = writeln!(out, "{} {}", a + 1, b + 1);
    }
    out
}

pub fn write_pajek(network: &Network, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, to_pajek(network)).map_err(|e| GameError::io(path, e))
}
