//! MySQL backend built on the blocking `mysql` driver.
//!
//! Accepted URL forms: `jdbc:mysql://host[:port]/database[?params]` and
//! `mysql://[user[:password]@]host[:port]/database`. JDBC query parameters
//! are ignored. Non-empty `jdbc.user` and `jdbc.password` take precedence
//! over credentials embedded in the URL.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder};
use tracing::debug;

use crate::config::JdbcSettings;
use crate::error::{Result, SynonymError};
use crate::store::connection::{Connection, ConnectionFactory, Row, Value};

pub const DEFAULT_PORT: u16 = 3306;

/// Where a MySQL URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MysqlTarget {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl MysqlTarget {
    /// Parse a `jdbc:mysql://` or `mysql://` URL.
    pub fn parse(url: &str) -> Result<Self> {
        let trimmed = url.trim();
        let rest = trimmed
            .strip_prefix("jdbc:")
            .unwrap_or(trimmed)
            .strip_prefix("mysql://")
            .ok_or_else(|| SynonymError::config(format!("'{url}' is not a mysql url")))?;

        let rest = rest.split_once('?').map_or(rest, |(head, _params)| head);
        let (authority, database) = rest.split_once('/').unwrap_or((rest, ""));

        let (credentials, address) = match authority.rsplit_once('@') {
            Some((credentials, address)) => (Some(credentials), address),
            None => (None, authority),
        };
        let (user, password) = match credentials {
            Some(c) => match c.split_once(':') {
                Some((u, p)) => (Some(u.to_string()), Some(p.to_string())),
                None => (Some(c.to_string()), None),
            },
            None => (None, None),
        };

        let (host, port) = Self::split_address(address, url)?;
        if host.is_empty() {
            return Err(SynonymError::config(format!("mysql url '{url}' has no host")));
        }

        Ok(Self {
            host,
            port,
            database: database.trim_end_matches('/').to_string(),
            user: user.filter(|u| !u.is_empty()),
            password,
        })
    }

    fn split_address(address: &str, url: &str) -> Result<(String, u16)> {
        // Bracketed IPv6 literal: [::1]:3306
        if let Some(inner) = address.strip_prefix('[') {
            let (host, tail) = inner
                .split_once(']')
                .ok_or_else(|| SynonymError::config(format!("unterminated host in '{url}'")))?;
            let port = match tail.strip_prefix(':') {
                Some(p) => Self::parse_port(p, url)?,
                None => DEFAULT_PORT,
            };
            return Ok((host.to_string(), port));
        }

        match address.rsplit_once(':') {
            Some((host, port)) => Ok((host.to_string(), Self::parse_port(port, url)?)),
            None => Ok((address.to_string(), DEFAULT_PORT)),
        }
    }

    fn parse_port(port: &str, url: &str) -> Result<u16> {
        port.parse()
            .map_err(|_| SynonymError::config(format!("invalid port '{port}' in '{url}'")))
    }

    /// Apply credentials from settings over those found in the URL.
    pub fn with_credentials(mut self, settings: &JdbcSettings) -> Self {
        if !settings.user.is_empty() {
            self.user = Some(settings.user.clone());
        }
        if !settings.password.is_empty() {
            self.password = Some(settings.password.clone());
        }
        self
    }
}

/// Opens MySQL connections over TCP.
#[derive(Debug, Clone)]
pub struct MysqlConnectionFactory {
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl Default for MysqlConnectionFactory {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
        }
    }
}

impl MysqlConnectionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    fn options(&self, target: &MysqlTarget) -> OptsBuilder {
        OptsBuilder::new()
            .ip_or_hostname(Some(target.host.clone()))
            .tcp_port(target.port)
            .db_name((!target.database.is_empty()).then(|| target.database.clone()))
            .user(target.user.clone())
            .pass(target.password.clone())
            .tcp_connect_timeout(Some(self.connect_timeout))
            .read_timeout(Some(self.read_timeout))
    }
}

impl ConnectionFactory for MysqlConnectionFactory {
    fn connect(&self, settings: &JdbcSettings) -> Result<Box<dyn Connection>> {
        let target = MysqlTarget::parse(&settings.url)?.with_credentials(settings);
        debug!(host = %target.host, port = target.port, database = %target.database, "opening mysql connection");

        let conn = Conn::new(self.options(&target)).map_err(|e| {
            SynonymError::connection(format!(
                "cannot connect to {}:{}: {e}",
                target.host, target.port
            ))
        })?;
        Ok(Box::new(MysqlConnection { conn }))
    }

    fn name(&self) -> &str {
        "mysql"
    }
}

/// One open MySQL session.
pub struct MysqlConnection {
    conn: Conn,
}

impl Connection for MysqlConnection {
    fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        let rows: Vec<mysql::Row> = self.conn.query(sql).map_err(|e| match SynonymError::from(e) {
            SynonymError::Query { message, .. } => SynonymError::query(message, sql),
            other => other,
        })?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let columns: Vec<String> = row
                    .columns_ref()
                    .iter()
                    .map(|c| c.name_str().into_owned())
                    .collect();
                let values = (0..row.len())
                    .map(|i| to_value(row.get::<mysql::Value, _>(i).unwrap_or(mysql::Value::NULL)))
                    .collect();
                Row::new(columns, values)
            })
            .collect())
    }

    fn is_valid(&mut self) -> bool {
        self.conn.query_drop("SELECT 1").is_ok()
    }

    fn close(self: Box<Self>) -> Result<()> {
        drop(self.conn);
        Ok(())
    }
}

/// Convert a driver value. Temporal values become text the version parser
/// understands.
fn to_value(value: mysql::Value) -> Value {
    match value {
        mysql::Value::NULL => Value::Null,
        mysql::Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Value::Text(text),
            Err(e) => Value::Blob(e.into_bytes()),
        },
        mysql::Value::Int(n) => Value::Integer(n),
        mysql::Value::UInt(n) => match i64::try_from(n) {
            Ok(n) => Value::Integer(n),
            Err(_) => Value::Text(n.to_string()),
        },
        mysql::Value::Float(f) => Value::Real(f as f64),
        mysql::Value::Double(d) => Value::Real(d),
        mysql::Value::Date(year, month, day, hour, min, sec, micro) => {
            let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32);
            let time = NaiveTime::from_hms_micro_opt(hour as u32, min as u32, sec as u32, micro);
            match (date, time) {
                (Some(date), Some(time)) => Value::Text(
                    NaiveDateTime::new(date, time)
                        .format("%Y-%m-%d %H:%M:%S%.f")
                        .to_string(),
                ),
                // Zero dates such as 0000-00-00 carry no instant.
                _ => Value::Null,
            }
        }
        mysql::Value::Time(negative, days, hour, min, sec, micro) => {
            let sign = if negative { "-" } else { "" };
            let hours = days * 24 + hour as u32;
            Value::Text(format!("{sign}{hours:02}:{min:02}:{sec:02}.{micro:06}"))
        }
    }
}
