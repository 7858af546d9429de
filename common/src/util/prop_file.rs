//
//  Copyright 2024 Google, Inc.
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at:
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

//! # PropFile class

use std::collections::HashMap;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::PathBuf;

/// System properties loaded from a `build.prop` style file.
///
/// Each line is `key=value`. Lines starting with `#` and lines without
/// a `=` are skipped.
pub struct PropFile {
    /// Properties keyed by name.
    props: HashMap<String, String>,
    /// The path to the property file.
    filepath: PathBuf,
}

impl PropFile {
    /// Creates an empty PropFile backed by `filepath`.
    ///
    /// # Arguments
    ///
    /// * `filepath` - The path to the property file.
    pub fn new(filepath: PathBuf) -> PropFile {
        PropFile { props: HashMap::new(), filepath }
    }

    /// Reads properties from the backing file, replacing any existing
    /// entries. A later line overrides an earlier one with the same key.
    ///
    /// # Returns
    ///
    /// `Ok` if the read was successful, `Error` otherwise.
    pub fn read(&mut self) -> std::io::Result<()> {
        self.props.clear();

        let f = File::open(&self.filepath)?;
        for line in BufReader::new(f).lines() {
            let line = line?;
            let line = line.trim_start();
            if line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                self.props.insert(key.trim().to_owned(), value.trim().to_owned());
            }
        }

        Ok(())
    }

    /// Gets the value of a property.
    ///
    /// # Returns
    ///
    /// An `Option` containing the value if it exists, `None` otherwise.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(|v| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.props.contains_key(key)
    }

    /// Sets a property in memory. The backing file is not touched.
    pub fn insert(&mut self, key: &str, value: &str) {
        self.props.insert(key.to_owned(), value.to_owned());
    }
}
