//! Record codec - Gateway documents to typed domain values
//!
//! On-wire field names follow the data the deployed database already
//! holds: `nombre`, `encargado`, `asistentes` for sectors and `fecha`,
//! `hora` for the event config.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tally_domain::{coerce_attendance_input, EventConfig, NewSector, Sector, SectorId, SectorPatch};

use crate::port::gateway::{Document, Fields};

pub(crate) const SECTOR_NAME: &str = "nombre";
pub(crate) const SECTOR_MANAGER: &str = "encargado";
pub(crate) const SECTOR_ATTENDEES: &str = "asistentes";
pub(crate) const CONFIG_DATE: &str = "fecha";
pub(crate) const CONFIG_TIME: &str = "hora";

#[derive(Debug, Deserialize)]
struct SectorRecord {
    #[serde(rename = "nombre")]
    name: String,
    #[serde(rename = "encargado")]
    manager: String,
    #[serde(rename = "asistentes", default, deserialize_with = "lenient_count")]
    attendee_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ConfigRecord {
    #[serde(rename = "fecha", default)]
    date: String,
    #[serde(rename = "hora", default)]
    time: String,
}

/// Integers are kept exactly, other non-negative numbers are truncated,
/// negatives read as 0 and numeric strings go through
/// [`coerce_attendance_input`]. Any other value reads as unset.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value {
        Value::Number(number) => Some(number.as_u64().unwrap_or_else(|| {
            match number.as_f64() {
                Some(value) if value.is_finite() && value > 0.0 => value.trunc() as u64,
                _ => 0,
            }
        })),
        Value::String(text) => Some(coerce_attendance_input(&text)),
        _ => None,
    }))
}

/// Result of decoding a sector snapshot
#[derive(Debug, Default)]
pub(crate) struct DecodedSectors {
    pub sectors: Vec<Sector>,
    pub skipped: usize,
}

/// Decode a full sector snapshot, preserving gateway order.
///
/// Malformed records are skipped. A repeated id replaces the earlier
/// record in place so ids stay unique.
pub(crate) fn decode_sectors(documents: Vec<Document>) -> DecodedSectors {
    let mut decoded = DecodedSectors::default();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for document in documents {
        let record: SectorRecord = match serde_json::from_value(Value::Object(document.fields)) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(sector = %document.id, error = %e, "skipping malformed sector record");
                decoded.skipped += 1;
                continue;
            }
        };

        let sector = Sector::new(SectorId::new(document.id.clone()), record.name, record.manager)
            .with_attendee_count(record.attendee_count);

        match positions.get(&document.id) {
            Some(&index) => {
                tracing::warn!(sector = %document.id, "duplicate sector id in snapshot, keeping last");
                decoded.sectors[index] = sector;
            }
            None => {
                positions.insert(document.id, decoded.sectors.len());
                decoded.sectors.push(sector);
            }
        }
    }

    decoded
}

/// Decode the config document. A malformed document reads as absent.
pub(crate) fn decode_config(fields: Option<Fields>) -> Option<EventConfig> {
    let fields = fields?;
    match serde_json::from_value::<ConfigRecord>(Value::Object(fields)) {
        Ok(record) => Some(EventConfig::new(record.date, record.time)),
        Err(e) => {
            tracing::warn!(error = %e, "config document is malformed, treating as absent");
            None
        }
    }
}

pub(crate) fn encode_new_sector(sector: &NewSector) -> Fields {
    let mut fields = Fields::new();
    fields.insert(SECTOR_NAME.to_string(), Value::from(sector.name()));
    fields.insert(SECTOR_MANAGER.to_string(), Value::from(sector.manager()));
    fields
}

pub(crate) fn encode_patch(patch: &SectorPatch) -> Fields {
    let mut fields = Fields::new();
    if let Some(name) = &patch.name {
        fields.insert(SECTOR_NAME.to_string(), Value::from(name.as_str()));
    }
    if let Some(manager) = &patch.manager {
        fields.insert(SECTOR_MANAGER.to_string(), Value::from(manager.as_str()));
    }
    if let Some(count) = patch.attendee_count {
        fields.insert(SECTOR_ATTENDEES.to_string(), Value::from(count));
    }
    fields
}

pub(crate) fn encode_config(config: &EventConfig) -> Fields {
    let mut fields = Fields::new();
    fields.insert(CONFIG_DATE.to_string(), Value::from(config.date()));
    fields.insert(CONFIG_TIME.to_string(), Value::from(config.time()));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: Value) -> Document {
        match value {
            Value::Object(fields) => Document::new(id, fields),
            _ => panic!("test documents must be objects"),
        }
    }

    #[test]
    fn test_decode_sectors() {
        let decoded = decode_sectors(vec![
            doc("a", json!({ "nombre": "Platea", "encargado": "Juan", "asistentes": 120 })),
            doc("b", json!({ "nombre": "Pullman", "encargado": "Ana" })),
            doc("c", json!({ "nombre": "Palco", "encargado": "Luis", "asistentes": null })),
        ]);

        assert_eq!(decoded.skipped, 0);
        assert_eq!(decoded.sectors.len(), 3);
        assert_eq!(decoded.sectors[0].attendee_count(), Some(120));
        assert_eq!(decoded.sectors[1].attendee_count(), None);
        assert_eq!(decoded.sectors[2].attendee_count(), None);
        assert_eq!(decoded.sectors[1].manager(), "Ana");
    }

    #[test]
    fn test_lenient_counts() {
        let decoded = decode_sectors(vec![
            doc("a", json!({ "nombre": "A", "encargado": "x", "asistentes": 12.7 })),
            doc("b", json!({ "nombre": "B", "encargado": "y", "asistentes": -3 })),
        ]);

        assert_eq!(decoded.sectors[0].attendee_count(), Some(12));
        assert_eq!(decoded.sectors[1].attendee_count(), Some(0));
    }

    #[test]
    fn test_string_and_large_counts() {
        let decoded = decode_sectors(vec![
            doc("a", json!({ "nombre": "A", "encargado": "x", "asistentes": "12" })),
            doc("b", json!({ "nombre": "B", "encargado": "y", "asistentes": 9007199254740993u64 })),
            doc("c", json!({ "nombre": "C", "encargado": "z", "asistentes": "muchos" })),
            doc("d", json!({ "nombre": "D", "encargado": "w", "asistentes": true })),
        ]);

        assert_eq!(decoded.skipped, 0);
        assert_eq!(decoded.sectors[0].attendee_count(), Some(12));
        assert_eq!(decoded.sectors[1].attendee_count(), Some(9007199254740993));
        assert_eq!(decoded.sectors[2].attendee_count(), Some(0));
        assert_eq!(decoded.sectors[3].attendee_count(), None);
    }

    #[test]
    fn test_malformed_and_duplicate_records() {
        let decoded = decode_sectors(vec![
            doc("a", json!({ "nombre": "Platea", "encargado": "Juan" })),
            doc("bad", json!({ "nombre": "Sin encargado" })),
            doc("a", json!({ "nombre": "Platea Alta", "encargado": "Juan", "asistentes": 4 })),
        ]);

        assert_eq!(decoded.skipped, 1);
        assert_eq!(decoded.sectors.len(), 1);
        assert_eq!(decoded.sectors[0].name(), "Platea Alta");
        assert_eq!(decoded.sectors[0].attendees(), 4);
    }

    #[test]
    fn test_decode_config() {
        assert_eq!(decode_config(None), None);

        let Value::Object(fields) = json!({ "fecha": "2026-10-17", "hora": "21:00" }) else {
            unreachable!()
        };
        assert_eq!(
            decode_config(Some(fields)),
            Some(EventConfig::new("2026-10-17", "21:00"))
        );

        let Value::Object(partial) = json!({ "fecha": "2026-10-17" }) else {
            unreachable!()
        };
        let config = decode_config(Some(partial)).unwrap();
        assert!(!config.is_configured());

        let Value::Object(wrong) = json!({ "fecha": 20261017 }) else {
            unreachable!()
        };
        assert_eq!(decode_config(Some(wrong)), None);
    }

    #[test]
    fn test_encode_patch_only_sets_provided_fields() {
        let fields = encode_patch(&SectorPatch::new().with_attendee_count(0));
        assert_eq!(Value::Object(fields), json!({ "asistentes": 0 }));

        let fields = encode_patch(&SectorPatch::new().with_name("Palco").with_manager("Luis"));
        assert_eq!(Value::Object(fields), json!({ "nombre": "Palco", "encargado": "Luis" }));
    }

    #[test]
    fn test_encode_new_sector_leaves_count_unset() {
        let sector = NewSector::new("Platea", "Juan").unwrap();
        let fields = encode_new_sector(&sector);
        assert!(!fields.contains_key(SECTOR_ATTENDEES));
        assert_eq!(fields[SECTOR_NAME], json!("Platea"));
    }
}
