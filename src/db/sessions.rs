use crate::types::{AppError, JsonMap, Result};
use chrono::Utc;
use libsql::{Builder, Connection, Database, Row, Value};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Author of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    User,
    Assistant,
    System,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::User => "user",
            MessageType::Assistant => "assistant",
            MessageType::System => "system",
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value {
            "user" => Ok(MessageType::User),
            "assistant" => Ok(MessageType::Assistant),
            "system" => Ok(MessageType::System),
            other => Err(AppError::Database(format!("Unknown message type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value {
            "pending" => Ok(ExecutionStatus::Pending),
            "running" => Ok(ExecutionStatus::Running),
            "completed" => Ok(ExecutionStatus::Completed),
            "failed" => Ok(ExecutionStatus::Failed),
            other => Err(AppError::Database(format!(
                "Unknown execution status '{}'",
                other
            ))),
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub session_name: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub is_active: bool,
    pub metadata: JsonMap,
}

/// A message to append to a session.
#[derive(Debug, Clone)]
pub struct NewMessage<'a> {
    pub session_id: &'a str,
    pub user_id: &'a str,
    pub message_type: MessageType,
    pub content: &'a str,
    pub metadata: JsonMap,
    pub token_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    pub message_type: MessageType,
    pub content: String,
    pub created_at: i64,
    pub metadata: JsonMap,
    pub token_count: i64,
}

/// The outcome of one agent run, as recorded after it finished.
#[derive(Debug, Clone)]
pub struct NewExecution<'a> {
    pub session_id: &'a str,
    pub user_id: &'a str,
    pub agent_type: &'a str,
    pub task: &'a str,
    pub status: ExecutionStatus,
    pub result: Option<&'a str>,
    pub error_message: Option<&'a str>,
    pub execution_time_ms: Option<u64>,
    pub token_usage: JsonMap,
    pub metadata: JsonMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    pub agent_type: String,
    pub task: String,
    pub status: ExecutionStatus,
    pub result: Option<String>,
    pub error_message: Option<String>,
    pub execution_time_ms: Option<i64>,
    pub token_usage: JsonMap,
    pub created_at: i64,
    pub completed_at: Option<i64>,
    pub metadata: JsonMap,
}

/// Append-only store for agent sessions, messages and execution records.
///
/// Holds a single connection so an in-memory database keeps its contents
/// for the lifetime of the store.
pub struct SessionStore {
    _db: Database,
    conn: Connection,
}

impl SessionStore {
    /// Open the database at `url`; `:memory:` gives a private in-memory store.
    pub async fn open(url: &str) -> Result<Self> {
        if url == ":memory:" {
            Self::new_memory().await
        } else {
            Self::new_local(url).await
        }
    }

    pub async fn new_local(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Database(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        Self::from_database(db).await
    }

    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to create in-memory database: {}", e)))?;

        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let store = Self { _db: db, conn };
        store.initialize_schema().await?;

        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS agent_sessions (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    session_name TEXT,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    metadata TEXT NOT NULL DEFAULT '{}'
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create agent_sessions table: {}", e)))?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS agent_messages (
                    id TEXT PRIMARY KEY,
                    session_id TEXT NOT NULL,
                    user_id TEXT NOT NULL,
                    message_type TEXT NOT NULL,
                    content TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    metadata TEXT NOT NULL DEFAULT '{}',
                    token_count INTEGER NOT NULL DEFAULT 0
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create agent_messages table: {}", e)))?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS agent_executions (
                    id TEXT PRIMARY KEY,
                    session_id TEXT NOT NULL,
                    user_id TEXT NOT NULL,
                    agent_type TEXT NOT NULL,
                    task TEXT NOT NULL,
                    status TEXT NOT NULL,
                    result TEXT,
                    error_message TEXT,
                    execution_time_ms INTEGER,
                    token_usage TEXT NOT NULL DEFAULT '{}',
                    created_at INTEGER NOT NULL,
                    completed_at INTEGER,
                    metadata TEXT NOT NULL DEFAULT '{}'
                )",
                (),
            )
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to create agent_executions table: {}", e))
            })?;

        for index in [
            "CREATE INDEX IF NOT EXISTS idx_agent_sessions_user ON agent_sessions(user_id)",
            "CREATE INDEX IF NOT EXISTS idx_agent_messages_session ON agent_messages(session_id)",
            "CREATE INDEX IF NOT EXISTS idx_agent_executions_session ON agent_executions(session_id)",
        ] {
            self.conn
                .execute(index, ())
                .await
                .map_err(|e| AppError::Database(format!("Failed to create index: {}", e)))?;
        }

        Ok(())
    }

    // Session operations
    pub async fn create_session(&self, user_id: &str, session_name: Option<&str>) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();

        self.conn
            .execute(
                "INSERT INTO agent_sessions (id, user_id, session_name, created_at, updated_at, is_active, metadata)
                 VALUES (?, ?, ?, ?, ?, 1, '{}')",
                vec![
                    Value::Text(id.clone()),
                    Value::Text(user_id.to_string()),
                    opt_text(session_name),
                    Value::Integer(now),
                    Value::Integer(now),
                ],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create session: {}", e)))?;

        info!(session_id = %id, user_id, "Created new agent session");
        Ok(id)
    }

    pub async fn get_session(&self, id: &str) -> Result<Option<SessionRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, user_id, session_name, created_at, updated_at, is_active, metadata
                 FROM agent_sessions WHERE id = ?",
                [id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query session: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => Ok(Some(SessionRecord {
                id: text(&row, 0)?,
                user_id: text(&row, 1)?,
                session_name: opt_text_col(&row, 2)?,
                created_at: integer(&row, 3)?,
                updated_at: integer(&row, 4)?,
                is_active: integer(&row, 5)? != 0,
                metadata: json_col(&row, 6)?,
            })),
            None => Ok(None),
        }
    }

    // Message operations
    pub async fn save_message(&self, message: NewMessage<'_>) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();

        self.conn
            .execute(
                "INSERT INTO agent_messages (id, session_id, user_id, message_type, content, created_at, metadata, token_count)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                vec![
                    Value::Text(id.clone()),
                    Value::Text(message.session_id.to_string()),
                    Value::Text(message.user_id.to_string()),
                    Value::Text(message.message_type.as_str().to_string()),
                    Value::Text(message.content.to_string()),
                    Value::Integer(now),
                    Value::Text(to_json(&message.metadata)?),
                    Value::Integer(message.token_count),
                ],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to save message: {}", e)))?;

        self.touch_session(message.session_id, now).await?;

        info!(
            message_id = %id,
            session_id = message.session_id,
            message_type = message.message_type.as_str(),
            "Saved message"
        );
        Ok(id)
    }

    pub async fn session_messages(&self, session_id: &str) -> Result<Vec<MessageRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, session_id, user_id, message_type, content, created_at, metadata, token_count
                 FROM agent_messages WHERE session_id = ? ORDER BY created_at ASC, rowid ASC",
                [session_id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query messages: {}", e)))?;

        let mut messages = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            messages.push(MessageRecord {
                id: text(&row, 0)?,
                session_id: text(&row, 1)?,
                user_id: text(&row, 2)?,
                message_type: MessageType::parse(&text(&row, 3)?)?,
                content: text(&row, 4)?,
                created_at: integer(&row, 5)?,
                metadata: json_col(&row, 6)?,
                token_count: integer(&row, 7)?,
            });
        }

        Ok(messages)
    }

    // Execution operations
    pub async fn save_execution(&self, execution: NewExecution<'_>) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();
        let completed_at = if execution.status.is_terminal() {
            Value::Integer(now)
        } else {
            Value::Null
        };

        self.conn
            .execute(
                "INSERT INTO agent_executions (id, session_id, user_id, agent_type, task, status, result,
                    error_message, execution_time_ms, token_usage, created_at, completed_at, metadata)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                vec![
                    Value::Text(id.clone()),
                    Value::Text(execution.session_id.to_string()),
                    Value::Text(execution.user_id.to_string()),
                    Value::Text(execution.agent_type.to_string()),
                    Value::Text(execution.task.to_string()),
                    Value::Text(execution.status.as_str().to_string()),
                    opt_text(execution.result),
                    opt_text(execution.error_message),
                    execution
                        .execution_time_ms
                        .map(|ms| Value::Integer(ms as i64))
                        .unwrap_or(Value::Null),
                    Value::Text(to_json(&execution.token_usage)?),
                    Value::Integer(now),
                    completed_at,
                    Value::Text(to_json(&execution.metadata)?),
                ],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to save execution: {}", e)))?;

        info!(
            execution_id = %id,
            session_id = execution.session_id,
            agent_type = execution.agent_type,
            "Saved execution"
        );
        Ok(id)
    }

    pub async fn session_executions(&self, session_id: &str) -> Result<Vec<ExecutionRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, session_id, user_id, agent_type, task, status, result, error_message,
                        execution_time_ms, token_usage, created_at, completed_at, metadata
                 FROM agent_executions WHERE session_id = ? ORDER BY created_at ASC, rowid ASC",
                [session_id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query executions: {}", e)))?;

        let mut executions = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            executions.push(ExecutionRecord {
                id: text(&row, 0)?,
                session_id: text(&row, 1)?,
                user_id: text(&row, 2)?,
                agent_type: text(&row, 3)?,
                task: text(&row, 4)?,
                status: ExecutionStatus::parse(&text(&row, 5)?)?,
                result: opt_text_col(&row, 6)?,
                error_message: opt_text_col(&row, 7)?,
                execution_time_ms: opt_integer(&row, 8)?,
                token_usage: json_col(&row, 9)?,
                created_at: integer(&row, 10)?,
                completed_at: opt_integer(&row, 11)?,
                metadata: json_col(&row, 12)?,
            });
        }

        Ok(executions)
    }

    async fn touch_session(&self, session_id: &str, now: i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE agent_sessions SET updated_at = ? WHERE id = ?",
                vec![Value::Integer(now), Value::Text(session_id.to_string())],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update session: {}", e)))?;
        Ok(())
    }
}

fn opt_text(value: Option<&str>) -> Value {
    value
        .map(|v| Value::Text(v.to_string()))
        .unwrap_or(Value::Null)
}

fn to_json(map: &JsonMap) -> Result<String> {
    serde_json::to_string(map).map_err(|e| AppError::Database(format!("Failed to encode JSON: {}", e)))
}

fn text(row: &Row, idx: i32) -> Result<String> {
    row.get::<String>(idx)
        .map_err(|e| AppError::Database(e.to_string()))
}

fn integer(row: &Row, idx: i32) -> Result<i64> {
    row.get::<i64>(idx)
        .map_err(|e| AppError::Database(e.to_string()))
}

fn opt_text_col(row: &Row, idx: i32) -> Result<Option<String>> {
    match row
        .get_value(idx)
        .map_err(|e| AppError::Database(e.to_string()))?
    {
        Value::Text(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn opt_integer(row: &Row, idx: i32) -> Result<Option<i64>> {
    match row
        .get_value(idx)
        .map_err(|e| AppError::Database(e.to_string()))?
    {
        Value::Integer(n) => Ok(Some(n)),
        _ => Ok(None),
    }
}

fn json_col(row: &Row, idx: i32) -> Result<JsonMap> {
    let raw = text(row, idx)?;
    serde_json::from_str(&raw).map_err(|e| AppError::Database(format!("Corrupt JSON column: {}", e)))
}
