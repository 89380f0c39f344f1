use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::errors::BombomError;
use crate::order::Order;
use crate::prompt::PromptTemplate;

const TEMPLATES_FILE: &str = "prompt_configs.jsonl";
const ORDERS_FILE: &str = "bombons.jsonl";
const TEMPLATES_LOCK: &str = "prompt_configs.lock";
const LOCK_ATTEMPTS: u32 = 250;
const LOCK_RETRY: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfigRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub template: PromptTemplate,
    pub created_at: DateTime<Utc>,
}

/// JSON-lines record files under one directory.
pub struct Store {
    dir: PathBuf,
}

fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path)?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("{}:{}: corrupt record", path.display(), n + 1))
        })
        .collect()
}

fn append_line<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", serde_json::to_string(record)?)?;
    Ok(())
}

/// Exclusive writer lock on the template records, released on drop.
struct WriteLock {
    path: PathBuf,
}

impl WriteLock {
    fn acquire(path: PathBuf) -> Result<Self> {
        for _ in 0..LOCK_ATTEMPTS {
            match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => thread::sleep(LOCK_RETRY),
                Err(e) => return Err(e.into()),
            }
        }
        bail!("template store is locked ({}); remove it if no other bombom_gen is running", path.display())
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        fs::remove_file(&self.path).ok();
    }
}

impl Store {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn templates_path(&self) -> PathBuf {
        self.dir.join(TEMPLATES_FILE)
    }

    fn lock_templates(&self) -> Result<WriteLock> {
        WriteLock::acquire(self.dir.join(TEMPLATES_LOCK))
    }

    fn orders_path(&self) -> PathBuf {
        self.dir.join(ORDERS_FILE)
    }

    /// Newest template by `created_at`; on a tie the later line wins.
    pub fn latest_template(&self) -> Result<Option<PromptConfigRecord>> {
        let records: Vec<PromptConfigRecord> = read_lines(&self.templates_path())?;
        Ok(records
            .into_iter()
            .enumerate()
            .max_by_key(|(n, r)| (r.created_at, *n))
            .map(|(_, r)| r))
    }

    pub fn require_template(&self) -> Result<PromptConfigRecord> {
        self.latest_template()?.ok_or_else(|| {
            BombomError::TemplateUnavailable(format!(
                "no records in {} (run `bombom_gen template init`)",
                self.templates_path().display()
            ))
            .into()
        })
    }

    pub fn insert_template(&self, template: PromptTemplate) -> Result<PromptConfigRecord> {
        let record = PromptConfigRecord { id: Uuid::new_v4(), template, created_at: Utc::now() };
        let _lock = self.lock_templates()?;
        append_line(&self.templates_path(), &record)?;
        tracing::info!(id = %record.id, "stored prompt template");
        Ok(record)
    }

    /// Replace the template text of record `id`, keeping its id and timestamp.
    pub fn update_template(&self, id: Uuid, template: PromptTemplate) -> Result<PromptConfigRecord> {
        let path = self.templates_path();
        let _lock = self.lock_templates()?;
        let mut records: Vec<PromptConfigRecord> = read_lines(&path)?;
        let updated = {
            let record = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| BombomError::TemplateUnavailable(format!("no template with id {id}")))?;
            record.template = template;
            record.clone()
        };

        let mut text = String::new();
        for r in &records {
            text.push_str(&serde_json::to_string(r)?);
            text.push('\n');
        }
        let tmp = NamedTempFile::new_in(&self.dir)?;
        fs::write(tmp.path(), text)?;
        tmp.persist(&path)?;
        tracing::info!(%id, "updated prompt template");
        Ok(updated)
    }

    pub fn append_order(&self, order: &Order) -> Result<()> {
        append_line(&self.orders_path(), order)?;
        tracing::info!(id = %order.id, "recorded order");
        Ok(())
    }

    pub fn orders(&self) -> Result<Vec<Order>> {
        read_lines(&self.orders_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tpl(base: &str) -> PromptTemplate {
        PromptTemplate { base_prompt: base.into(), negative_prompt: "n".into() }
    }

    #[test]
    fn empty_store_has_no_template() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("nested")).unwrap();
        assert!(store.latest_template().unwrap().is_none());
        let err = store.require_template().unwrap_err();
        assert!(matches!(err.downcast_ref::<BombomError>(), Some(BombomError::TemplateUnavailable(_))));
    }

    #[test]
    fn latest_created_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let now = Utc::now();
        let newer = PromptConfigRecord { id: Uuid::new_v4(), template: tpl("newer"), created_at: now };
        let older = PromptConfigRecord { id: Uuid::new_v4(), template: tpl("older"), created_at: now - Duration::hours(1) };
        append_line(&store.templates_path(), &newer).unwrap();
        append_line(&store.templates_path(), &older).unwrap();
        assert_eq!(store.require_template().unwrap().template.base_prompt, "newer");

        let tie = PromptConfigRecord { id: Uuid::new_v4(), template: tpl("tie"), created_at: now };
        append_line(&store.templates_path(), &tie).unwrap();
        assert_eq!(store.require_template().unwrap().template.base_prompt, "tie");
    }

    #[test]
    fn update_rewrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let first = store.insert_template(tpl("a {base}")).unwrap();
        let second = store.insert_template(tpl("b")).unwrap();

        let updated = store.update_template(first.id, tpl("edited")).unwrap();
        assert_eq!(updated.created_at, first.created_at);

        let all: Vec<PromptConfigRecord> = read_lines(&store.templates_path()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].template.base_prompt, "edited");
        assert_eq!(all[1], second);

        let err = store.update_template(Uuid::new_v4(), tpl("x")).unwrap_err();
        assert!(err.downcast_ref::<BombomError>().is_some());
    }

    #[test]
    fn updates_do_not_lose_concurrent_inserts() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let first = store.insert_template(tpl("first")).unwrap();

        thread::scope(|s| {
            for n in 0..8 {
                let store = &store;
                s.spawn(move || store.insert_template(tpl(&format!("insert {n}"))).unwrap());
            }
            for n in 0..8 {
                store.update_template(first.id, tpl(&format!("edit {n}"))).unwrap();
            }
        });

        let all: Vec<PromptConfigRecord> = read_lines(&store.templates_path()).unwrap();
        assert_eq!(all.len(), 9);
        assert_eq!(all[0].template.base_prompt, "edit 7");
        assert!(!dir.path().join(TEMPLATES_LOCK).exists());
    }

    #[test]
    fn corrupt_line_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        fs::write(store.templates_path(), "\n{not json}\n").unwrap();
        let err = store.latest_template().unwrap_err();
        assert!(err.to_string().ends_with(":2: corrupt record"));
    }
}
