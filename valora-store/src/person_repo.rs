use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use valora_core::{CoreError, CoreResult, Person, PersonRepository};

const HEADER: [&str; 4] = ["id", "name", "email", "phone"];

/// Person records kept in a single CSV file with an `id,name,email,phone` header.
///
/// Every mutation rewrites or appends to the file while holding `last_id`, so
/// concurrent callers never interleave writes or hand out the same id.
pub struct CsvPersonRepository {
    path: PathBuf,
    last_id: Mutex<i64>,
}

// On-disk shape; contact fields are stored in clear
#[derive(Debug, Serialize, Deserialize)]
struct PersonRow {
    id: i64,
    name: String,
    email: String,
    phone: String,
}

impl From<PersonRow> for Person {
    fn from(row: PersonRow) -> Self {
        Person {
            id: Some(row.id),
            name: row.name,
            email: row.email.into(),
            phone: row.phone.into(),
        }
    }
}

impl PersonRow {
    fn from_person(id: i64, person: &Person) -> Self {
        Self {
            id,
            name: person.name.clone(),
            email: person.email.reveal().clone(),
            phone: person.phone.reveal().clone(),
        }
    }
}

fn storage_error(context: &str, err: impl std::fmt::Display) -> CoreError {
    CoreError::StorageError(format!("{}: {}", context, err))
}

impl CsvPersonRepository {
    /// Open the file at `path`, creating it (and its parent directories) with
    /// just the header when missing.
    pub async fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(CoreError::ValidationError(
                "Storage path must not be empty".to_string(),
            ));
        }

        if fs::try_exists(&path)
            .await
            .map_err(|e| storage_error("Failed to stat people file", e))?
        {
            debug!(path = %path.display(), "Opening existing people file");
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| storage_error("Failed to create storage directory", e))?;
            }
            fs::write(&path, encode(&[])?)
                .await
                .map_err(|e| storage_error("Failed to create people file", e))?;
            debug!(path = %path.display(), "Created people file");
        }

        let rows = read_rows(&path).await?;
        let last_id = rows.iter().map(|row| row.id).max().unwrap_or(0);

        Ok(Self {
            path,
            last_id: Mutex::new(last_id),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_people(&self) -> CoreResult<Vec<Person>> {
        Ok(read_rows(&self.path)
            .await?
            .into_iter()
            .map(Person::from)
            .collect())
    }

    /// Replace the whole file through a sibling temp file
    async fn write_rows(&self, rows: &[PersonRow]) -> CoreResult<()> {
        let tmp = self.path.with_extension("csv.tmp");
        fs::write(&tmp, encode(rows)?)
            .await
            .map_err(|e| storage_error("Failed to write people file", e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| storage_error("Failed to replace people file", e))
    }
}

async fn read_rows(path: &Path) -> CoreResult<Vec<PersonRow>> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| storage_error("Failed to read people file", e))?;
    Ok(decode(&bytes))
}

/// Parse rows, skipping (and logging) any line that is not a complete record
fn decode(bytes: &[u8]) -> Vec<PersonRow> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    reader
        .deserialize::<PersonRow>()
        .filter_map(|row| match row {
            Ok(row) => Some(row),
            Err(e) => {
                warn!("Skipping malformed person row: {}", e);
                None
            }
        })
        .collect()
}

fn encode(rows: &[PersonRow]) -> CoreResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(HEADER)
        .map_err(|e| storage_error("Failed to encode header", e))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| storage_error("Failed to encode person", e))?;
    }
    writer
        .into_inner()
        .map_err(|e| storage_error("Failed to flush encoder", e))
}

async fn missing_trailing_newline(file: &mut fs::File) -> std::io::Result<bool> {
    if file.metadata().await?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] != b'\n')
}

fn encode_row(row: &PersonRow) -> CoreResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .serialize(row)
        .map_err(|e| storage_error("Failed to encode person", e))?;
    writer
        .into_inner()
        .map_err(|e| storage_error("Failed to flush encoder", e))
}

#[async_trait]
impl PersonRepository for CsvPersonRepository {
    async fn create(&self, person: Person) -> CoreResult<Person> {
        person.validate()?;

        let mut last_id = self.last_id.lock().await;
        let id = *last_id + 1;
        let mut line = encode_row(&PersonRow::from_person(id, &person))?;

        let mut file = fs::OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| storage_error("Failed to open people file", e))?;
        // Hand-edited files may end mid-line
        if missing_trailing_newline(&mut file)
            .await
            .map_err(|e| storage_error("Failed to inspect people file", e))?
        {
            line.insert(0, b'\n');
        }
        file.write_all(&line)
            .await
            .map_err(|e| storage_error("Failed to append person", e))?;
        file.flush()
            .await
            .map_err(|e| storage_error("Failed to append person", e))?;

        *last_id = id;
        info!(id, "Person created");
        Ok(Person {
            id: Some(id),
            ..person
        })
    }

    async fn find_by_id(&self, id: i64) -> CoreResult<Option<Person>> {
        let _guard = self.last_id.lock().await;
        Ok(self
            .read_people()
            .await?
            .into_iter()
            .find(|p| p.id == Some(id)))
    }

    async fn find_by_name_prefix(&self, prefix: &str) -> CoreResult<Vec<Person>> {
        let prefix = prefix.to_lowercase();
        let _guard = self.last_id.lock().await;
        Ok(self
            .read_people()
            .await?
            .into_iter()
            .filter(|p| p.name.to_lowercase().starts_with(&prefix))
            .collect())
    }

    async fn update(&self, person: &Person) -> CoreResult<()> {
        let id = person.id.ok_or_else(|| {
            CoreError::ValidationError("Person must have an id to be updated".to_string())
        })?;
        person.validate()?;

        let _guard = self.last_id.lock().await;
        let mut rows = read_rows(&self.path).await?;
        let slot = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("Person {}", id)))?;
        *slot = PersonRow::from_person(id, person);

        self.write_rows(&rows).await?;
        info!(id, "Person updated");
        Ok(())
    }

    async fn delete(&self, id: i64) -> CoreResult<()> {
        let _guard = self.last_id.lock().await;
        let mut rows = read_rows(&self.path).await?;
        let before = rows.len();
        rows.retain(|row| row.id != id);
        if rows.len() == before {
            return Err(CoreError::NotFound(format!("Person {}", id)));
        }

        self.write_rows(&rows).await?;
        info!(id, "Person deleted");
        Ok(())
    }

    async fn count(&self) -> CoreResult<usize> {
        let _guard = self.last_id.lock().await;
        Ok(read_rows(&self.path).await?.len())
    }

    async fn list_all(&self) -> CoreResult<Vec<Person>> {
        let _guard = self.last_id.lock().await;
        self.read_people().await
    }

    async fn clear_all(&self) -> CoreResult<()> {
        // Ids keep counting up so cleared records are never confused with new ones
        let _guard = self.last_id.lock().await;
        self.write_rows(&[]).await?;
        info!("People file cleared");
        Ok(())
    }
}
