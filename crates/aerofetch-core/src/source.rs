use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Immutable configuration for one external data provider.
///
/// Created from static configuration at process start and never mutated.
/// Fields the core does not interpret (per-provider station lists, query
/// templates, scraping hints) are kept verbatim in `extra` and passed
/// through to the adapter. Credentials are opaque strings; the core never
/// parses or validates their format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub name: String,
    pub adapter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, rename = "sourceURL", skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, rename = "apitoken", skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const fn default_active() -> bool {
    true
}

impl Source {
    pub fn named(name: impl Into<String>, adapter: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            adapter: adapter.into(),
            url: None,
            country: None,
            city: None,
            location: None,
            timezone: None,
            source_url: None,
            organization: None,
            api_token: None,
            active: true,
            extra: Map::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_organization(
        mut self,
        organization: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        self.organization = Some(organization.into());
        self.source_url = Some(source_url.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Name used when the pipeline fills in a missing attribution entry.
    pub fn attribution_name(&self) -> &str {
        self.organization.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_provider_config_with_opaque_extras() {
        let source: Source = serde_json::from_value(json!({
            "name": "GIOS",
            "adapter": "json-api",
            "url": "https://api.gios.gov.pl/pjp-api/rest/data",
            "country": "PL",
            "timezone": "Europe/Warsaw",
            "sourceURL": "http://powietrze.gios.gov.pl/",
            "organization": "Polish Chief Inspectorate of Environmental Protection",
            "stationFilter": "wios",
            "stations": ["117", "530"]
        }))
        .expect("must deserialize");

        assert_eq!(source.name, "GIOS");
        assert!(source.active);
        assert_eq!(source.extra["stationFilter"], "wios");
        assert_eq!(source.extra["stations"][1], "530");
    }

    #[test]
    fn attribution_name_falls_back_to_source_name() {
        let plain = Source::named("acumar", "json-api");
        assert_eq!(plain.attribution_name(), "acumar");

        let with_org = plain.with_organization("ACUMAR", "http://www.acumar.gov.ar/");
        assert_eq!(with_org.attribution_name(), "ACUMAR");
    }
}
