//! Extraction of `(template, net)` pairs from SPICE netlist text.
//!
//! Only enough of the grammar is understood to find subcircuit boundaries
//! and the node positions of each device line.

/// A `(template, net)` name pair.
type Pair = (String, String);

/// Scans `text` and returns every `(template, net)` pair it declares, in
/// order of appearance. Duplicates are left in; the identifier index
/// removes them.
///
/// Device lines outside any `.subckt` block are attributed to `top` when it
/// is given and ignored otherwise.
#[must_use]
pub fn extract_identifiers(text: &str, top: Option<&str>) -> Vec<Pair> {
    let mut pairs = Vec::new();
    let mut current: Option<String> = None;

    for statement in statements(text) {
        let tokens: Vec<&str> = statement.split_whitespace().collect();
        let Some(&first) = tokens.first() else {
            continue;
        };

        if first.starts_with('.') {
            match first.to_ascii_lowercase().as_str() {
                ".subckt" => {
                    let Some(&name) = tokens.get(1) else {
                        tracing::debug!("Skipping .subckt without a name");
                        continue;
                    };
                    let ports = tokens[2..].iter().take_while(|t| !t.contains('='));
                    pairs.extend(ports.map(|port| (name.to_string(), (*port).to_string())));
                    current = Some(name.to_string());
                }
                ".ends" => current = None,
                _ => {}
            }
            continue;
        }

        let Some(template) = current.as_deref().or(top) else {
            continue;
        };
        pairs.extend(
            device_nodes(&tokens)
                .iter()
                .map(|node| (template.to_string(), (*node).to_string())),
        );
    }

    tracing::debug!("Extracted {} identifiers from netlist", pairs.len());
    pairs
}

/// Logical statements: comments stripped, `+` continuations joined.
fn statements(text: &str) -> Vec<String> {
    let mut statements: Vec<String> = Vec::new();

    for raw in text.lines() {
        let line = raw.split(['$', ';']).next().unwrap_or_default().trim();
        if line.is_empty() || line.starts_with('*') {
            continue;
        }
        if let Some(continuation) = line.strip_prefix('+') {
            let continuation = continuation.trim();
            match statements.last_mut() {
                Some(previous) => {
                    previous.push(' ');
                    previous.push_str(continuation);
                }
                None => statements.push(continuation.to_string()),
            }
            continue;
        }
        statements.push(line.to_string());
    }

    statements
}

/// The node tokens of a device line.
fn device_nodes<'a>(tokens: &[&'a str]) -> Vec<&'a str> {
    let Some(letter) = tokens.first().and_then(|name| name.chars().next()) else {
        return Vec::new();
    };

    let count = match letter.to_ascii_uppercase() {
        'M' | 'E' | 'G' => 4,
        'Q' | 'J' => 3,
        'R' | 'C' | 'L' | 'D' | 'V' | 'I' | 'F' | 'H' | 'B' => 2,
        'X' => {
            // Nodes sit between the instance name and the subcircuit name,
            // which is the last token that is not a parameter.
            let Some(subckt) = tokens.iter().rposition(|t| !t.contains('=')) else {
                return Vec::new();
            };
            return tokens.get(1..subckt).map(<[_]>::to_vec).unwrap_or_default();
        }
        _ => 0,
    };

    tokens
        .iter()
        .skip(1)
        .take(count)
        .filter(|t| !t.contains('='))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETLIST: &str = "\
* test netlist
.SUBCKT inv A Y VDD VSS W=1u
M1 Y A VDD VDD pmos L=1
mn Y A VSS VSS nmos $ inline comment
.ends inv

.subckt buf IN OUT VDD VSS
X1 IN mid VDD VSS inv
X2 mid OUT
+ VDD VSS inv m=2
R1 OUT load 1k ; resistor
K1 L1 L2 0.9
.ends

M9 top1 top2 top3 top4 nmos
";

    fn pairs(text: &str, top: Option<&str>) -> Vec<String> {
        extract_identifiers(text, top)
            .into_iter()
            .map(|(t, n)| format!("{t}:{n}"))
            .collect()
    }

    #[test]
    fn extracts_ports_and_device_nodes() {
        assert_eq!(
            pairs(NETLIST, None),
            [
                "inv:A", "inv:Y", "inv:VDD", "inv:VSS",
                "inv:Y", "inv:A", "inv:VDD", "inv:VDD",
                "inv:Y", "inv:A", "inv:VSS", "inv:VSS",
                "buf:IN", "buf:OUT", "buf:VDD", "buf:VSS",
                "buf:IN", "buf:mid", "buf:VDD", "buf:VSS",
                "buf:mid", "buf:OUT", "buf:VDD", "buf:VSS",
                "buf:OUT", "buf:load",
            ]
        );
    }

    #[test]
    fn top_level_devices_need_a_top_name() {
        let with_top = pairs(NETLIST, Some("chip"));
        assert_eq!(
            &with_top[with_top.len() - 4..],
            ["chip:top1", "chip:top2", "chip:top3", "chip:top4"]
        );
    }

    #[test]
    fn continuation_without_a_statement_starts_one() {
        assert_eq!(pairs("+ R1 a b 1k", Some("t")), ["t:a", "t:b"]);
    }

    #[test]
    fn unnamed_subckt_is_ignored() {
        assert!(pairs(".subckt\nR1 a b 1\n.ends", None).is_empty());
    }
}
