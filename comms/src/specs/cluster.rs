use std::{env, io, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::msg::{Rank, SERVER_RANK};

const DEFAULT_BACKEND: &str = "tcp";

/// The transport used to connect the processes of a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// One TCP connection per client, every process on its own.
    Tcp,
}

impl FromStr for Backend {
    type Err = io::Error;

    fn from_str(s: &str) -> io::Result<Self> {
        match s {
            "tcp" => Ok(Self::Tcp),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported transport backend `{other}`"),
            )),
        }
    }
}

/// Bootstrap parameters of a single process of the cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub server_addr: String,
    pub world_size: u32,
    pub rank: Rank,
    pub backend: Backend,
}

impl ClusterSpec {
    /// Reads the specification from the `SERVER_ADDR`, `WORLD_SIZE`, `RANK`
    /// and `BACKEND` environment variables.
    ///
    /// # Returns
    /// A validated `ClusterSpec` or an `InvalidInput` io error.
    pub fn from_env() -> io::Result<Self> {
        let spec = Self {
            server_addr: var("SERVER_ADDR")?,
            world_size: parse(&var("WORLD_SIZE")?, "WORLD_SIZE")?,
            rank: parse(&var("RANK")?, "RANK")?,
            backend: env::var("BACKEND")
                .unwrap_or_else(|_| DEFAULT_BACKEND.to_string())
                .parse()?,
        };

        spec.validate()?;
        Ok(spec)
    }

    /// Checks that the cluster has at least one client and that the rank is part of it.
    pub fn validate(&self) -> io::Result<()> {
        if self.world_size < 2 {
            return Err(invalid(format!(
                "world size must count the server and at least one client, got {}",
                self.world_size
            )));
        }

        if self.rank >= self.world_size {
            return Err(invalid(format!(
                "rank {} is outside of a world of size {}",
                self.rank, self.world_size
            )));
        }

        Ok(())
    }

    /// The amount of clients in the cluster.
    pub fn client_count(&self) -> usize {
        (self.world_size - 1) as usize
    }

    pub fn is_server(&self) -> bool {
        self.rank == SERVER_RANK
    }
}

fn var(key: &str) -> io::Result<String> {
    env::var(key).map_err(|e| invalid(format!("{key}: {e}")))
}

fn parse<T: FromStr>(value: &str, key: &str) -> io::Result<T> {
    value
        .parse()
        .map_err(|_| invalid(format!("{key}: `{value}` is not a valid number")))
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}
