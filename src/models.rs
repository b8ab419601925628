use serde::Deserialize;
use serde::Serialize;

/// Partial calendar date as reported by profile providers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateParts {
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
}

impl DateParts {
    /// Render as "Jan 2020", "2020" or an empty string
    pub fn display(&self) -> String {
        const MONTHS: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        match (self.month, self.year) {
            (Some(month @ 1..=12), Some(year)) => format!("{} {year}", MONTHS[month as usize - 1]),
            (_, Some(year)) => year.to_string(),
            _ => String::new(),
        }
    }
}

/// One position in the work history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "company_name")]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateParts>,
    /// `None` while the position is current
    #[serde(default)]
    pub ends_at: Option<DateParts>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Experience {
    pub fn is_current(&self) -> bool {
        self.ends_at.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default, alias = "school_name")]
    pub school: Option<String>,
    #[serde(default, alias = "degree_name")]
    pub degree: Option<String>,
    #[serde(default)]
    pub field_of_study: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateParts>,
    #[serde(default)]
    pub ends_at: Option<DateParts>,
}

/// Skills arrive either as plain strings or as `{ "name": ... }` objects
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SkillEntry {
    Name(String),
    Object { name: String },
}

fn deserialize_skills<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let entries: Option<Vec<SkillEntry>> = Option::deserialize(deserializer)?;
    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .map(|entry| match entry {
            SkillEntry::Name(name) | SkillEntry::Object { name } => name,
        })
        .filter(|name| !name.trim().is_empty())
        .collect())
}

fn deserialize_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Professional profile of one person, read-only once fetched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, alias = "city")]
    pub location: Option<String>,
    #[serde(default, alias = "country_full_name")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub experiences: Vec<Experience>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub education: Vec<Education>,
    #[serde(default, deserialize_with = "deserialize_skills")]
    pub skills: Vec<String>,
}

impl Profile {
    /// Parse a provider JSON document
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// True when the document carries nothing worth indexing
    pub fn is_empty(&self) -> bool {
        let blank =
            |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());
        blank(&self.full_name)
            && blank(&self.headline)
            && blank(&self.summary)
            && self.experiences.is_empty()
            && self.education.is_empty()
            && self.skills.is_empty()
    }

    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("Unknown")
    }

    /// Title of the first position without an end date
    pub fn current_title(&self) -> Option<&str> {
        self.experiences
            .iter()
            .filter(|exp| exp.is_current())
            .find_map(|exp| exp.title.as_deref())
    }

    /// Render the profile as the plain-text document that gets chunked and embedded
    pub fn to_document(&self) -> String {
        let mut sections: Vec<String> = Vec::new();

        let mut header = Vec::new();
        if let Some(name) = non_blank(self.full_name.as_ref()) {
            header.push(format!("Name: {name}"));
        }
        if let Some(headline) = non_blank(self.headline.as_ref()) {
            header.push(format!("Headline: {headline}"));
        }
        match (non_blank(self.location.as_ref()), non_blank(self.country.as_ref())) {
            (Some(location), Some(country)) if !location.contains(country) => {
                header.push(format!("Location: {location}, {country}"));
            }
            (Some(place), _) | (None, Some(place)) => header.push(format!("Location: {place}")),
            (None, None) => {}
        }
        if let Some(summary) = non_blank(self.summary.as_ref()) {
            header.push(format!("Summary: {summary}"));
        }
        if !header.is_empty() {
            sections.push(header.join("\n"));
        }

        if !self.experiences.is_empty() {
            let mut lines = vec!["Experience:".to_string()];
            lines.extend(self.experiences.iter().map(format_experience));
            sections.push(lines.join("\n"));
        }

        if !self.education.is_empty() {
            let mut lines = vec!["Education:".to_string()];
            lines.extend(self.education.iter().map(format_education));
            sections.push(lines.join("\n"));
        }

        if !self.skills.is_empty() {
            sections.push(format!("Skills: {}", self.skills.join(", ")));
        }

        sections.join("\n\n")
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).map(str::trim).filter(|v| !v.is_empty())
}

fn format_period(
    starts_at: Option<&DateParts>,
    ends_at: Option<&DateParts>,
    open_ended: bool,
) -> Option<String> {
    let start = starts_at.map(DateParts::display).filter(|s| !s.is_empty());
    let end = match ends_at {
        Some(end) => Some(end.display()).filter(|s| !s.is_empty()),
        None if open_ended => Some("Present".to_string()),
        None => None,
    };
    match (start, end) {
        (Some(start), Some(end)) => Some(format!("{start} - {end}")),
        (Some(start), None) => Some(start),
        (None, Some(end)) => Some(format!("until {end}")),
        (None, None) => None,
    }
}

fn format_experience(exp: &Experience) -> String {
    let mut line = String::from("- ");
    match (non_blank(exp.title.as_ref()), non_blank(exp.company.as_ref())) {
        (Some(title), Some(company)) => line.push_str(&format!("Title: {title} at {company}")),
        (Some(title), None) => line.push_str(&format!("Title: {title}")),
        (None, Some(company)) => line.push_str(&format!("Worked at {company}")),
        (None, None) => line.push_str("Position"),
    }
    if let Some(location) = non_blank(exp.location.as_ref()) {
        line.push_str(&format!(" ({location})"));
    }
    let open_ended = exp.starts_at.is_some();
    if let Some(period) = format_period(exp.starts_at.as_ref(), exp.ends_at.as_ref(), open_ended) {
        line.push_str(&format!(", {period}"));
    }
    line.push('.');
    if let Some(description) = non_blank(exp.description.as_ref()) {
        line.push(' ');
        line.push_str(description);
    }
    line
}

fn format_education(edu: &Education) -> String {
    let mut parts = Vec::new();
    match (non_blank(edu.degree.as_ref()), non_blank(edu.field_of_study.as_ref())) {
        (Some(degree), Some(field)) => parts.push(format!("{degree} in {field}")),
        (Some(degree), None) => parts.push(degree.to_string()),
        (None, Some(field)) => parts.push(format!("Studied {field}")),
        (None, None) => {}
    }
    if let Some(school) = non_blank(edu.school.as_ref()) {
        parts.push(school.to_string());
    }
    if let Some(period) = format_period(edu.starts_at.as_ref(), edu.ends_at.as_ref(), false) {
        parts.push(period);
    }
    format!("- {}", parts.join(", "))
}

/// Bounded slice of a profile document, positioned in characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Position in the segment sequence
    pub index: usize,
    /// Character offset of the first character
    pub start: usize,
    /// Character offset one past the last character
    pub end: usize,
    /// Characters shared with the previous segment
    pub overlap: usize,
    pub text: String,
}

impl Segment {
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}
