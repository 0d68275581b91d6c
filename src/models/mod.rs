use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which fields the pipeline tracks. The site has been scraped with two
/// slightly different downstream schemas: the basic one keeps the free-text
/// description, the extended one keeps the publish date instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    Basic,
    Extended,
}

/// Value of one detail row: a normalized tri-state flag, or the raw text
/// when the value is not one of the known Ja/Nej/"Ikke angivet" tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailValue {
    Flag(bool),
    Text(String),
}

impl DetailValue {
    fn as_text(&self) -> String {
        match self {
            DetailValue::Text(s) => s.clone(),
            DetailValue::Flag(true) => "Ja".to_string(),
            DetailValue::Flag(false) => "Nej".to_string(),
        }
    }

    fn as_flag(&self) -> bool {
        match self {
            DetailValue::Flag(b) => *b,
            DetailValue::Text(_) => false,
        }
    }
}

/// Labels the downstream schema treats as housing attributes.
pub const HOUSING_LABELS: [&str; 16] = [
    "Boligtype",
    "Størrelse",
    "Værelser",
    "Etage",
    "Møbleret",
    "Delevenlig",
    "Husdyr tilladt",
    "Elevator",
    "Seniorvenlig",
    "Kun for studerende",
    "Altan/terrasse",
    "Parkering",
    "Opvaskemaskine",
    "Vaskemaskine",
    "Ladestander",
    "Tørretumbler",
];

/// Labels the downstream schema treats as rental terms.
pub const RENTAL_LABELS: [&str; 9] = [
    "Lejeperiode",
    "Ledig fra",
    "Månedlig leje",
    "Aconto",
    "Depositum",
    "Forudbetalt husleje",
    "Indflytningspris",
    "Oprettelsesdato",
    "Sagsnr.",
];

/// Flat parse result for one listing detail page.
///
/// The detail rows on the page are a single list of label/value pairs;
/// `housing()` and `rental()` are two logical views over the same map, the
/// split only matters to the flattened storage schema.
#[derive(Debug, Clone)]
pub struct ListingDetails {
    pub title: String,
    pub description: Option<String>,
    pub published_date: Option<String>,
    pub city: String,
    pub images: Vec<String>,
    pub details: HashMap<String, DetailValue>,
}

impl ListingDetails {
    /// Housing-attribute grouping over the combined detail map. The two
    /// views are the public face of the housing/rental split; the storage
    /// flattening pulls individual labels straight from the map instead of
    /// going through a view, since each schema column names its label.
    pub fn housing(&self) -> impl Iterator<Item = (&str, &DetailValue)> {
        self.details
            .iter()
            .filter(|(k, _)| HOUSING_LABELS.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Rental-term grouping, the counterpart view to [`housing`](Self::housing).
    pub fn rental(&self) -> impl Iterator<Item = (&str, &DetailValue)> {
        self.details
            .iter()
            .filter(|(k, _)| RENTAL_LABELS.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v))
    }

    fn text(&self, label: &str) -> String {
        self.details
            .get(label)
            .map(DetailValue::as_text)
            .unwrap_or_default()
    }

    fn flag(&self, label: &str) -> bool {
        self.details
            .get(label)
            .map(DetailValue::as_flag)
            .unwrap_or(false)
    }
}

/// A listing flattened to the storage schema, keyed by `url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredListing {
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    pub city: String,
    pub images: Vec<String>,
    pub boligtype: String,
    pub storrelse: String,
    pub vaerelser: String,
    pub etage: String,
    pub moebleret: bool,
    pub delevenlig: bool,
    pub husdyr_tilladt: bool,
    pub elevator: bool,
    pub seniorvenlig: bool,
    pub kun_studerende: bool,
    pub altan_terrasse: bool,
    pub parkering: bool,
    pub opvaskemaskine: bool,
    pub vaskemaskine: bool,
    pub ladestander: String,
    pub toerretumbler: String,
    pub lejeperiode: String,
    pub ledig_fra: Option<String>,
    pub maanedlig_leje: String,
    pub aconto: String,
    pub depositum: String,
    pub forudbetalt_husleje: String,
    pub indflytningspris: String,
    pub oprettelsesdato: Option<String>,
    pub sagsnr: String,
}

impl StoredListing {
    /// Flatten a parsed page into the storage schema. Absent labels become
    /// empty strings or `false`; the two date-like rental fields become
    /// `None` when the source holds a placeholder.
    pub fn from_details(details: &ListingDetails, url: &str) -> Self {
        // "Ledig fra" keeps the original quirk: an explicit
        // "Snarest muligt" maps to NULL, absence maps to the phrase itself.
        let ledig_fra = match details.details.get("Ledig fra") {
            Some(v) => {
                let text = v.as_text();
                if text == "Snarest muligt" {
                    None
                } else {
                    Some(text)
                }
            }
            None => Some("Snarest muligt".to_string()),
        };

        let oprettelsesdato = details.details.get("Oprettelsesdato").and_then(|v| {
            let text = v.as_text();
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        });

        Self {
            url: url.to_string(),
            title: details.title.clone(),
            description: details.description.clone(),
            published_date: details.published_date.clone(),
            city: details.city.clone(),
            images: details.images.clone(),
            boligtype: details.text("Boligtype"),
            storrelse: details.text("Størrelse"),
            vaerelser: details.text("Værelser"),
            etage: details.text("Etage"),
            moebleret: details.flag("Møbleret"),
            delevenlig: details.flag("Delevenlig"),
            husdyr_tilladt: details.flag("Husdyr tilladt"),
            elevator: details.flag("Elevator"),
            seniorvenlig: details.flag("Seniorvenlig"),
            kun_studerende: details.flag("Kun for studerende"),
            altan_terrasse: details.flag("Altan/terrasse"),
            parkering: details.flag("Parkering"),
            opvaskemaskine: details.flag("Opvaskemaskine"),
            vaskemaskine: details.flag("Vaskemaskine"),
            ladestander: details.text("Ladestander"),
            toerretumbler: details.text("Tørretumbler"),
            lejeperiode: details.text("Lejeperiode"),
            ledig_fra,
            maanedlig_leje: details.text("Månedlig leje"),
            aconto: details.text("Aconto"),
            depositum: details.text("Depositum"),
            forudbetalt_husleje: details.text("Forudbetalt husleje"),
            indflytningspris: details.text("Indflytningspris"),
            oprettelsesdato,
            sagsnr: details.text("Sagsnr."),
        }
    }
}
