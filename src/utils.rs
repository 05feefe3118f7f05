use chrono::{Datelike, Utc};
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

pub fn current_time_millis() -> i64 {
  Utc::now().timestamp_millis()
}

pub fn current_time_secs() -> i64 {
  Utc::now().timestamp()
}

pub fn gen_random_string() -> String {
  // encode 32 bytes of random in base64
  base64_url::encode(&thread_rng().gen::<[u8; 32]>())
}

pub fn hash_str(key: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(key);
  let result = hasher.finalize();
  base64_url::encode(&result)
}

// <year><4 random digits>, e.g. 20261234
pub fn gen_secondary_id() -> i64 {
  let year = Utc::now().year() as i64;
  year * 10_000 + thread_rng().gen_range(1000..10_000)
}

pub fn is_secure_password(password: &str) -> bool {
  password.chars().count() >= 8
}

// local@domain.tld with no whitespace and exactly one '@'
pub fn is_email_valid(email: &str) -> bool {
  if email.chars().any(char::is_whitespace) {
    return false;
  }

  let (local, domain) = match email.split_once('@') {
    Some(parts) => parts,
    None => return false,
  };

  if local.is_empty() || domain.contains('@') {
    return false;
  }

  domain
    .char_indices()
    .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Argon2 parameters, read once at startup.
#[derive(Clone, Copy, Debug)]
pub struct HashConfig {
  pub time_cost: u32,
  pub mem_cost: u32,
}

impl Default for HashConfig {
  fn default() -> Self {
    let config = argon2::Config::default();
    HashConfig {
      time_cost: config.time_cost,
      mem_cost: config.mem_cost,
    }
  }
}

impl HashConfig {
  // argon2 only checks its limits when hashing, so hash once at startup
  pub fn validate(&self) -> Result<(), argon2::Error> {
    hash_password("hash-config-check", self).map(|_| ())
  }
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, argon2::Error> {
  argon2::verify_encoded(password_hash, password.as_bytes())
}

pub fn hash_password(password: &str, hash_config: &HashConfig) -> Result<String, argon2::Error> {
  argon2::hash_encoded(
    // password
    password.as_bytes(),
    // salt
    &thread_rng().gen::<[u8; 32]>(),
    //config
    &argon2::Config {
      time_cost: hash_config.time_cost,
      mem_cost: hash_config.mem_cost,
      ..argon2::Config::default()
    },
  )
}

// argon2 at full cost is slow in debug builds
#[cfg(test)]
pub fn cheap_hash_config() -> HashConfig {
  HashConfig {
    time_cost: 1,
    mem_cost: 64,
  }
}
