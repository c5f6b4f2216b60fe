//! Small ref types and a loader shared by the unit tests.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::SourceError;
use crate::hardpoint::{HardpointSet, RawValue, Template};
use crate::record::{Phid, RemoteRecord};
use crate::reference::{ObjectRef, RefHandle, RefType};
use crate::resolver::{HardpointLoader, LoadOutcome};
use crate::source::{RemoteQuery, RemoteSource};

pub const NOTE_TASKS: &str = "note.tasks";
pub const NOTE_ASSIGNEE: &str = "note.assignee";
pub const NOTE_WORD_COUNT: &str = "note.wordCount";
pub const TASK_SEARCH: &str = "task.search";

pub fn note_record(id: u64, title: &str) -> RemoteRecord {
    record(json!({
        "id": id,
        "phid": format!("PHID-NOTE-{id}"),
        "fields": { "title": title }
    }))
}

pub fn task_record(id: u64, note_id: u64) -> RemoteRecord {
    record(json!({
        "id": id,
        "phid": format!("PHID-TASK-{id}"),
        "fields": { "notePHID": format!("PHID-NOTE-{note_id}") }
    }))
}

fn record(value: Value) -> RemoteRecord {
    RemoteRecord::from_value(value).unwrap()
}

#[derive(Debug)]
pub struct NoteRef {
    record: RemoteRecord,
    phid: Option<Phid>,
    hardpoints: HardpointSet,
}

impl ObjectRef for NoteRef {
    fn ref_type(&self) -> &'static str {
        Self::REF_TYPE
    }

    fn id(&self) -> Option<u64> {
        self.record.id()
    }

    fn phid(&self) -> Option<&Phid> {
        self.phid.as_ref()
    }

    fn monogram(&self) -> String {
        format!("N{}", self.id().map(|id| id.to_string()).unwrap_or_default())
    }

    fn parameters(&self) -> &RemoteRecord {
        &self.record
    }

    fn hardpoints(&self) -> &HardpointSet {
        &self.hardpoints
    }
}

impl RefType for NoteRef {
    const REF_TYPE: &'static str = "note";

    fn new_from_remote(record: RemoteRecord) -> Self {
        Self {
            phid: record.phid(),
            record,
            hardpoints: HardpointSet::new()
                .declare(NOTE_TASKS, Template::object_list::<TaskRef>())
                .declare(NOTE_ASSIGNEE, Template::object::<TaskRef>())
                .declare(NOTE_WORD_COUNT, Template::scalar()),
        }
    }
}

#[derive(Debug)]
pub struct TaskRef {
    record: RemoteRecord,
    phid: Option<Phid>,
    hardpoints: HardpointSet,
}

impl ObjectRef for TaskRef {
    fn ref_type(&self) -> &'static str {
        Self::REF_TYPE
    }

    fn id(&self) -> Option<u64> {
        self.record.id()
    }

    fn phid(&self) -> Option<&Phid> {
        self.phid.as_ref()
    }

    fn monogram(&self) -> String {
        format!("T{}", self.id().map(|id| id.to_string()).unwrap_or_default())
    }

    fn parameters(&self) -> &RemoteRecord {
        &self.record
    }

    fn hardpoints(&self) -> &HardpointSet {
        &self.hardpoints
    }
}

impl RefType for TaskRef {
    const REF_TYPE: &'static str = "task";

    fn new_from_remote(record: RemoteRecord) -> Self {
        Self {
            phid: record.phid(),
            record,
            hardpoints: HardpointSet::new(),
        }
    }
}

/// Serves `note.tasks` with one task search per batch, and `note.wordCount`
/// from the note's own title.
pub struct NoteTasksLoader;

#[async_trait]
impl HardpointLoader for NoteTasksLoader {
    fn hardpoints(&self) -> &[&'static str] {
        &[NOTE_TASKS, NOTE_WORD_COUNT]
    }

    async fn load(
        &self,
        source: &dyn RemoteSource,
        hardpoint: &str,
        refs: &[RefHandle],
    ) -> Result<Vec<LoadOutcome>, SourceError> {
        if hardpoint == NOTE_WORD_COUNT {
            return Ok(refs
                .iter()
                .map(|note| {
                    let words = note
                        .parameters()
                        .str_at(&["fields", "title"])
                        .map(|title| title.split_whitespace().count())
                        .unwrap_or(0);
                    Ok(RawValue::Scalar(json!(words)))
                })
                .collect());
        }

        let phids: Vec<String> = refs
            .iter()
            .filter_map(|note| note.phid().map(|phid| phid.to_string()))
            .collect();
        let query = RemoteQuery::search(TASK_SEARCH).with_identifiers("notes", phids);
        let tasks = source.search(query).await?;

        Ok(refs
            .iter()
            .map(|note| {
                let phid = note.phid().ok_or_else(|| {
                    SourceError::NotFound(format!("{} has no PHID", note.monogram()))
                })?;
                Ok(RawValue::Records(
                    tasks
                        .iter()
                        .filter(|task| task.str_at(&["fields", "notePHID"]) == Some(phid.as_str()))
                        .cloned()
                        .collect(),
                ))
            })
            .collect())
    }
}
