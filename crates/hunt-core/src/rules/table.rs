//! Rule Table
//!
//! Immutable percept → action mapping for one agent kind, validated in
//! full at load time so lookup never falls through at run time.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::action::{ActionDescriptor, ActionSpec, ActionTag, Choice, ProbabilitySpec};
use super::percept::Percept;
use crate::components::motion::{Label, Rotation};
use crate::error::{MalformedRuleError, UnmatchedPerceptError};

/// One row of a rule table
#[derive(Debug, Clone)]
pub struct Rule<P: Percept> {
    pub index: u32,
    pub pattern: P,
    pub action: ActionDescriptor<P::Direction>,
    pub note: Option<String>,
}

/// Validated lookup structure keyed by canonical rule key
#[derive(Debug, Clone)]
pub struct RuleTable<P: Percept> {
    rules: Vec<Rule<P>>,
    by_key: HashMap<P, usize>,
}

impl<P: Percept> RuleTable<P> {
    /// Expected header columns: `rule`, the sensors in order, `action`
    pub fn header() -> Vec<&'static str> {
        let mut columns = vec!["rule"];
        columns.extend(P::SENSORS.iter().map(|s| s.name));
        columns.push("action");
        columns
    }

    /// Load and validate a table from a CSV file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MalformedRuleError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| MalformedRuleError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse and validate, requiring every reachable percept to be covered
    pub fn parse(text: &str) -> Result<Self, MalformedRuleError> {
        let table = Self::parse_partial(text)?;
        table.ensure_complete()?;
        Ok(table)
    }

    /// Parse and validate rows without the coverage check
    pub fn parse_partial(text: &str) -> Result<Self, MalformedRuleError> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());
        let header = reader.headers().map_err(|e| syntax(0, e))?.clone();
        if header.is_empty() {
            return Err(MalformedRuleError::Empty);
        }
        let expected = Self::header();
        let matches = header.len() == expected.len()
            && header.iter().zip(&expected).all(|(h, e)| h.eq_ignore_ascii_case(e));
        if !matches {
            return Err(MalformedRuleError::Header {
                expected: expected.join(","),
                found: header.iter().collect::<Vec<_>>().join(","),
            });
        }

        let mut table = Self {
            rules: Vec::new(),
            by_key: HashMap::new(),
        };
        let mut rows_by_index: HashMap<u32, usize> = HashMap::new();

        for (offset, record) in reader.records().enumerate() {
            let row = offset + 1;
            let record = record.map_err(|e| syntax(row, e))?;
            let rule = parse_row::<P>(row, &record, expected.len())?;

            if let Some(&first_row) = rows_by_index.get(&rule.index) {
                return Err(MalformedRuleError::DuplicateIndex {
                    row,
                    index: rule.index,
                    first_row,
                });
            }
            if rule.pattern.rule_key() != rule.pattern {
                return Err(MalformedRuleError::Unreachable { row });
            }
            if let Some(&existing) = table.by_key.get(&rule.pattern) {
                return Err(MalformedRuleError::DuplicatePattern {
                    row,
                    index: table.rules[existing].index,
                });
            }

            rows_by_index.insert(rule.index, row);
            table.by_key.insert(rule.pattern, table.rules.len());
            table.rules.push(rule);
        }

        Ok(table)
    }

    fn ensure_complete(&self) -> Result<(), MalformedRuleError> {
        let mut missing = self.missing_keys();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_by_key(|p| p.readings());
        Err(MalformedRuleError::MissingPattern {
            missing: missing.len(),
            example: missing[0].describe(),
        })
    }

    /// Reachable rule keys with no row
    pub fn missing_keys(&self) -> Vec<P> {
        P::reachable_keys()
            .into_iter()
            .filter(|k| !self.by_key.contains_key(k))
            .collect()
    }

    /// Find the rule for a percept after special-rule canonicalization
    pub fn lookup(&self, percept: &P) -> Result<(u32, &ActionDescriptor<P::Direction>), UnmatchedPerceptError> {
        self.rule(percept)
            .map(|r| (r.index, &r.action))
            .ok_or_else(|| UnmatchedPerceptError {
                kind: P::KIND,
                percept: percept.describe(),
            })
    }

    pub fn rule(&self, percept: &P) -> Option<&Rule<P>> {
        self.by_key.get(&percept.rule_key()).map(|&i| &self.rules[i])
    }

    /// Rules in file order
    pub fn rules(&self) -> &[Rule<P>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn syntax(row: usize, err: csv::Error) -> MalformedRuleError {
    MalformedRuleError::Syntax {
        row,
        message: err.to_string(),
    }
}

fn parse_row<P: Percept>(row: usize, record: &StringRecord, width: usize) -> Result<Rule<P>, MalformedRuleError> {
    if record.len() != width {
        return Err(MalformedRuleError::FieldCount {
            row,
            expected: width,
            found: record.len(),
        });
    }

    let index: u32 = record[0].parse().map_err(|_| MalformedRuleError::NotInteger {
        row,
        column: "rule".to_string(),
        value: record[0].to_string(),
    })?;

    let mut values = Vec::with_capacity(P::SENSORS.len());
    for (sensor, raw) in P::SENSORS.iter().zip(record.iter().skip(1).take(width - 2)) {
        let value: i64 = raw.parse().map_err(|_| MalformedRuleError::NotInteger {
            row,
            column: sensor.name.to_string(),
            value: raw.to_string(),
        })?;
        if !sensor.accepts(value) {
            return Err(MalformedRuleError::OutOfDomain {
                row,
                sensor: sensor.name,
                value,
            });
        }
        values.push(value as i8);
    }
    let pattern = P::from_readings(&values).ok_or_else(|| MalformedRuleError::Syntax {
        row,
        message: "readings do not form a percept".to_string(),
    })?;

    let (action, note) = parse_action::<P>(row, &record[width - 1])?;
    Ok(Rule {
        index,
        pattern,
        action,
        note,
    })
}

fn parse_action<P: Percept>(
    row: usize,
    text: &str,
) -> Result<(ActionDescriptor<P::Direction>, Option<String>), MalformedRuleError> {
    let spec: ActionSpec = serde_json::from_str(text).map_err(|e| MalformedRuleError::ActionJson {
        row,
        message: e.to_string(),
    })?;
    let tag = ActionTag::parse(&spec.tag).ok_or_else(|| MalformedRuleError::UnknownAction {
        row,
        tag: spec.tag.clone(),
    })?;
    if !P::supports(tag) {
        return Err(MalformedRuleError::UnsupportedAction {
            row,
            tag: spec.tag.clone(),
            kind: P::KIND,
        });
    }

    let descriptor = match tag {
        ActionTag::Move => ActionDescriptor::Move(parse_choice::<P::Direction>(row, &spec)?),
        ActionTag::Rotate => ActionDescriptor::Rotate(parse_choice::<Rotation>(row, &spec)?),
        ActionTag::Destroy => ActionDescriptor::Destroy,
        ActionTag::Idle => ActionDescriptor::Idle,
        ActionTag::RememberVoid => ActionDescriptor::RememberVoid,
    };
    Ok((descriptor, spec.note))
}

fn parse_choice<T: Label>(row: usize, spec: &ActionSpec) -> Result<Choice<T>, MalformedRuleError> {
    if spec.directions.is_empty() {
        return Err(MalformedRuleError::MissingDirections {
            row,
            tag: spec.tag.clone(),
        });
    }
    let candidates = spec
        .directions
        .iter()
        .map(|d| {
            T::from_label(d).ok_or_else(|| MalformedRuleError::UnknownDirection {
                row,
                direction: d.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let invalid = |reason: String| MalformedRuleError::Probability { row, reason };
    let mut choice = Choice::uniform(candidates);
    match &spec.probability {
        None => {}
        Some(ProbabilitySpec::Chance(p)) => {
            if !(0.0..=1.0).contains(p) {
                return Err(invalid(format!("chance {} is outside [0, 1]", p)));
            }
            choice.chance = Some(*p);
        }
        Some(ProbabilitySpec::Weights(weights)) => {
            if weights.len() != choice.candidates.len() {
                return Err(invalid(format!(
                    "{} weights for {} directions",
                    weights.len(),
                    choice.candidates.len()
                )));
            }
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(invalid("weights must be finite and non-negative".to_string()));
            }
            if weights.iter().sum::<f64>() <= 0.0 {
                return Err(invalid("weights sum to zero".to_string()));
            }
            choice.weights = Some(weights.clone());
        }
    }
    Ok(choice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::motion::{AbsoluteDir, RelativeDir};
    use crate::rules::percept::{MonsterPercept, Presence, RobotPercept, VoidReading};

    const IDLE: &str = r#""{""type"":""idle""}""#;

    /// A complete table with every key mapped to idle, in key order
    fn complete_text<P: Percept>() -> String {
        let mut keys: Vec<P> = P::reachable_keys().into_iter().collect();
        keys.sort_by_key(|k| k.readings());
        let mut text = RuleTable::<P>::header().join(",");
        for (i, key) in keys.iter().enumerate() {
            let values: Vec<String> = key.readings().iter().map(|v| v.to_string()).collect();
            text.push_str(&format!("\n{},{},{}", i + 1, values.join(","), IDLE));
        }
        text.push('\n');
        text
    }

    fn replace_action(text: &str, row: usize, action: &str) -> String {
        text.lines()
            .enumerate()
            .map(|(i, line)| {
                if i == row {
                    let cut = line.find(",\"").unwrap_or(line.len());
                    format!("{},{}", &line[..cut], action)
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_complete_tables_load() {
        let robot = RuleTable::<RobotPercept>::parse(&complete_text::<RobotPercept>()).unwrap();
        assert_eq!(robot.len(), 35);
        let monster = RuleTable::<MonsterPercept>::parse(&complete_text::<MonsterPercept>()).unwrap();
        assert_eq!(monster.len(), 64);
    }

    #[test]
    fn test_missing_pattern_rejected() {
        let text = complete_text::<MonsterPercept>();
        let truncated: Vec<&str> = text.lines().take(64).collect();
        let err = RuleTable::<MonsterPercept>::parse(&truncated.join("\n")).unwrap_err();
        assert!(matches!(err, MalformedRuleError::MissingPattern { missing: 1, .. }));
    }

    #[test]
    fn test_partial_table_lookup_is_unmatched() {
        let text = complete_text::<MonsterPercept>();
        let truncated: Vec<&str> = text.lines().take(10).collect();
        let table = RuleTable::<MonsterPercept>::parse_partial(&truncated.join("\n")).unwrap();
        assert_eq!(table.missing_keys().len(), 55);

        let covered = table.rules()[0].pattern;
        assert!(table.lookup(&covered).is_ok());

        let uncovered = table.missing_keys()[0];
        let err = table.lookup(&uncovered).unwrap_err();
        assert_eq!(err.kind, hunt_events::AgentKind::Monster);
        assert_eq!(err.percept, uncovered.describe());
    }

    #[test]
    fn test_duplicate_pattern_names_row() {
        let mut text = complete_text::<MonsterPercept>();
        text.push_str(&format!("65,0,0,0,0,0,0,{}\n", IDLE));
        let err = RuleTable::<MonsterPercept>::parse(&text).unwrap_err();
        assert!(matches!(err, MalformedRuleError::DuplicatePattern { row: 65, .. }));
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let text = complete_text::<MonsterPercept>().replacen("\n2,", "\n1,", 1);
        let err = RuleTable::<MonsterPercept>::parse(&text).unwrap_err();
        assert!(matches!(
            err,
            MalformedRuleError::DuplicateIndex {
                row: 2,
                index: 1,
                first_row: 1
            }
        ));
    }

    #[test]
    fn test_out_of_domain_reading() {
        let text = format!("{}\n1,0,0,0,0,0,1,{}\n", RuleTable::<MonsterPercept>::header().join(","), IDLE);
        let err = RuleTable::<MonsterPercept>::parse(&text).unwrap_err();
        assert!(matches!(
            err,
            MalformedRuleError::OutOfDomain {
                row: 1,
                sensor: "behind",
                value: 1
            }
        ));
    }

    #[test]
    fn test_shadowed_pattern_is_unreachable() {
        // void=-1 with front=1 can never be a rule key
        let text = format!(
            "{}\n1,0,0,0,-1,1,0,0,0,{}\n",
            RuleTable::<RobotPercept>::header().join(","),
            IDLE
        );
        let err = RuleTable::<RobotPercept>::parse(&text).unwrap_err();
        assert!(matches!(err, MalformedRuleError::Unreachable { row: 1 }));
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let text = complete_text::<MonsterPercept>().replacen('\n', "\n\n", 1).replace('\n', "\r\n");
        let table = RuleTable::<MonsterPercept>::parse(&text).unwrap();
        assert_eq!(table.len(), 64);
        assert!(matches!(RuleTable::<MonsterPercept>::parse(""), Err(MalformedRuleError::Empty)));
    }

    #[test]
    fn test_quoted_action_unescapes() {
        let header = RuleTable::<MonsterPercept>::header().join(",");
        let row = r#"1, 0,0,0,0,0,0 ,"{""type"":""idle"",""note"":""a, b""}""#;
        let text = format!("{}\n{}\n", header, row);
        let table = RuleTable::<MonsterPercept>::parse_partial(&text).unwrap();
        assert_eq!(table.rules()[0].note.as_deref(), Some("a, b"));
    }

    #[test]
    fn test_header_mismatch() {
        let text = "rule,top,left,front,right,down,action\n";
        let err = RuleTable::<MonsterPercept>::parse(text).unwrap_err();
        assert!(matches!(err, MalformedRuleError::Header { .. }));
    }

    #[test]
    fn test_field_count_and_integer_errors() {
        let header = RuleTable::<MonsterPercept>::header().join(",");
        let err = RuleTable::<MonsterPercept>::parse(&format!("{}\n1,0,0,{}\n", header, IDLE)).unwrap_err();
        assert!(matches!(err, MalformedRuleError::FieldCount { row: 1, .. }));

        let err = RuleTable::<MonsterPercept>::parse(&format!("{}\nx,0,0,0,0,0,0,{}\n", header, IDLE)).unwrap_err();
        assert!(matches!(err, MalformedRuleError::NotInteger { row: 1, .. }));
    }

    #[test]
    fn test_action_validation() {
        let text = complete_text::<MonsterPercept>();
        let cases = [
            (r#""{""type"":""fly""}""#, "unknown"),
            (r#""{""type"":""destroy""}""#, "unsupported"),
            (r#""{""type"":""move"",""directions"":[""up""]}""#, "direction"),
            (r#""{""type"":""move""}""#, "missing"),
            (r#""{""type"":""move"",""directions"":[""top""],""probability"":1.5}""#, "probability"),
            (r#""{""type"":""move"",""directions"":[""top"",""left""],""probability"":[1.0]}""#, "probability"),
            (r#""not json""#, "json"),
        ];
        for (action, expected) in cases {
            let err = RuleTable::<MonsterPercept>::parse(&replace_action(&text, 3, action)).unwrap_err();
            let ok = match expected {
                "unknown" => matches!(err, MalformedRuleError::UnknownAction { row: 3, .. }),
                "unsupported" => matches!(err, MalformedRuleError::UnsupportedAction { row: 3, .. }),
                "direction" => matches!(err, MalformedRuleError::UnknownDirection { row: 3, .. }),
                "missing" => matches!(err, MalformedRuleError::MissingDirections { row: 3, .. }),
                "probability" => matches!(err, MalformedRuleError::Probability { row: 3, .. }),
                _ => matches!(err, MalformedRuleError::ActionJson { row: 3, .. }),
            };
            assert!(ok, "{} produced {:?}", action, err);
        }
    }

    #[test]
    fn test_parsed_descriptor_and_note() {
        let text = replace_action(
            &complete_text::<MonsterPercept>(),
            1,
            r#""{""type"":""move_random"",""directions"":[""top"",""behind""],""probability"":[0.2,0.8],""note"":""drift""}""#,
        );
        let table = RuleTable::<MonsterPercept>::parse(&text).unwrap();
        let rule = &table.rules()[0];
        assert_eq!(rule.note.as_deref(), Some("drift"));
        assert_eq!(
            rule.action,
            ActionDescriptor::Move(Choice::weighted(vec![AbsoluteDir::Top, AbsoluteDir::Behind], vec![0.2, 0.8]))
        );
    }

    #[test]
    fn test_special_rule_lookup_ignores_other_sensors() {
        let text = replace_action(
            &complete_text::<RobotPercept>(),
            1,
            r#""{""type"":""move"",""directions"":[""left""]}""#,
        );
        let table = RuleTable::<RobotPercept>::parse(&text).unwrap();
        // keys sort by readings, so the void key (-1 in column four) is first
        assert_eq!(table.rules()[0].pattern.void_front, VoidReading::Collided);

        let percept = RobotPercept {
            void_front: VoidReading::Collided,
            front: Presence::Present,
            left: Presence::Present,
            ..Default::default()
        };
        let (index, action) = table.lookup(&percept).unwrap();
        assert_eq!(index, 1);
        assert_eq!(action, &ActionDescriptor::Move(Choice::single(RelativeDir::Left)));
    }
}
