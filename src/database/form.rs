use std::{collections::HashMap, str::FromStr};

use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, TypeError};

pub type FormData = HashMap<String, Value>;

/// Submitted fields of a server action.
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn get_value<T>(&self, key: &str) -> Result<T, Error>
    where
        T: TryFrom<Value>,
    {
        match self.inner.get(key) {
            Some(value) => value
                .to_owned()
                .try_into()
                .map_err(|_e| TypeError::new(&format!("Invalid value for {key}")).into()),
            None => Err(TypeError::new(&format!("Missing field {key}")).into()),
        }
    }

    /// Accepts both JSON numbers and numeric strings, since HTML forms post strings.
    pub fn get_number<T>(&self, key: &str) -> Result<T, Error>
    where
        T: FromStr,
    {
        let raw = match self.inner.get(key) {
            Some(Value::String(v)) => v.trim().to_string(),
            Some(Value::Number(v)) => v.to_string(),
            Some(_) => return Err(TypeError::new(&format!("Invalid value for {key}")).into()),
            None => return Err(TypeError::new(&format!("Missing field {key}")).into()),
        };

        raw.parse()
            .map_err(|_e| TypeError::new(&format!("Invalid number for {key}")).into())
    }

    pub fn get_optional_number<T>(&self, key: &str) -> Result<Option<T>, Error>
    where
        T: FromStr,
    {
        match self.inner.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(v)) if v.trim().is_empty() => Ok(None),
            Some(_) => self.get_number(key).map(Some),
        }
    }

    /// Checkboxes post `"on"`, JSON clients post booleans.
    pub fn get_bool(&self, key: &str) -> Result<bool, Error> {
        match self.inner.get(key) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(v)) => Ok(*v),
            Some(Value::String(v)) => match v.trim() {
                "true" | "on" | "1" => Ok(true),
                "false" | "off" | "0" | "" => Ok(false),
                _ => Err(TypeError::new(&format!("Invalid value for {key}")).into()),
            },
            Some(_) => Err(TypeError::new(&format!("Invalid value for {key}")).into()),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, Error> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.to_string()),
                None => Err(TypeError::new(&format!("Invalid value for {key}")).into()),
            },
            None => Err(TypeError::new(&format!("Missing field {key}")).into()),
        }
    }

    /// Missing, null and blank fields all read as `None`.
    pub fn get_optional_str(&self, key: &str) -> Result<Option<String>, Error> {
        match self.inner.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(v)) if v.trim().is_empty() => Ok(None),
            Some(Value::String(v)) => Ok(Some(v.to_string())),
            Some(_) => Err(TypeError::new(&format!("Invalid value for {key}")).into()),
        }
    }

    pub fn get_uuid(&self, key: &str) -> Result<Uuid, Error> {
        let value = self.get_str(key)?;
        Uuid::parse_str(value.trim())
            .map_err(|_e| TypeError::new(&format!("Invalid id for {key}")).into())
    }

    /// Reads an array of ids; a missing field is an empty list.
    pub fn get_uuid_list(&self, key: &str) -> Result<Vec<Uuid>, Error> {
        match self.inner.get(key) {
            None | Some(Value::Null) => Ok(vec![]),
            Some(Value::Array(values)) => values
                .iter()
                .map(|value| {
                    value
                        .as_str()
                        .and_then(|v| Uuid::parse_str(v.trim()).ok())
                        .ok_or_else(|| Error::from(TypeError::new(&format!("Invalid id in {key}"))))
                })
                .collect(),
            Some(_) => Err(TypeError::new(&format!("Invalid value for {key}")).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::Difficulty;

    fn form(value: Value) -> Form {
        Form::from_data(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn numbers_from_strings_and_numbers() {
        let form = form(json!({ "a": "12", "b": 7, "c": "x" }));
        assert_eq!(form.get_number::<i32>("a").unwrap(), 12);
        assert_eq!(form.get_number::<i32>("b").unwrap(), 7);
        assert_eq!(form.get_number::<i32>("c").unwrap_err().code, 400);
        assert!(form.get_number::<i32>("missing").is_err());
    }

    #[test]
    fn optional_numbers_and_bools() {
        let form = form(json!({ "rating": "4.5", "blank": "", "on": "on", "flag": true }));
        assert_eq!(form.get_optional_number::<f64>("rating").unwrap(), Some(4.5));
        assert_eq!(form.get_optional_number::<f64>("blank").unwrap(), None);
        assert_eq!(form.get_optional_number::<f64>("absent").unwrap(), None);
        assert!(form.get_bool("on").unwrap());
        assert!(form.get_bool("flag").unwrap());
        assert!(!form.get_bool("absent").unwrap());
        assert!(form.get_bool("rating").is_err());
    }

    #[test]
    fn optional_strings() {
        let form = form(json!({ "notes": "  ", "other": null, "text": "hi" }));
        assert_eq!(form.get_optional_str("notes").unwrap(), None);
        assert_eq!(form.get_optional_str("other").unwrap(), None);
        assert_eq!(form.get_optional_str("absent").unwrap(), None);
        assert_eq!(form.get_optional_str("text").unwrap().as_deref(), Some("hi"));
    }

    #[test]
    fn enum_values_and_id_lists() {
        let id = Uuid::new_v4();
        let form = form(json!({
            "difficulty": "hard",
            "tags": [id.to_string()],
            "broken": ["not-an-id"],
        }));

        assert_eq!(
            form.get_value::<Difficulty>("difficulty").unwrap(),
            Difficulty::Hard
        );
        assert_eq!(form.get_uuid_list("tags").unwrap(), vec![id]);
        assert!(form.get_uuid_list("none").unwrap().is_empty());
        assert!(form.get_uuid_list("broken").is_err());
    }
}
