use crate::error::AppError;
use chrono::NaiveDate;

pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";
pub const DATE_DISPLAY_FORMAT: &str = "%B %d, %Y";
pub const CLASSES_HELD: std::ops::RangeInclusive<u8> = 1..=4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseName {
    IndianKnowledgeSystem,
    Marketing,
    Management,
    Analytics,
    Visualisation,
    Economics,
    Statistics,
    Accounting,
}

impl CourseName {
    pub const ALL: [CourseName; 8] = [
        CourseName::IndianKnowledgeSystem,
        CourseName::Marketing,
        CourseName::Management,
        CourseName::Analytics,
        CourseName::Visualisation,
        CourseName::Economics,
        CourseName::Statistics,
        CourseName::Accounting,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CourseName::IndianKnowledgeSystem => "Indian Knowledge System",
            CourseName::Marketing => "Marketing",
            CourseName::Management => "Management",
            CourseName::Analytics => "Analytics",
            CourseName::Visualisation => "Visualisation",
            CourseName::Economics => "Economics",
            CourseName::Statistics => "Statistics",
            CourseName::Accounting => "Accounting",
        }
    }

    pub fn parse(raw: &str) -> Option<CourseName> {
        let t = raw.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(t))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseType {
    Theory,
    Practical,
}

impl CourseType {
    pub const ALL: [CourseType; 2] = [CourseType::Theory, CourseType::Practical];

    pub fn label(self) -> &'static str {
        match self {
            CourseType::Theory => "Theory",
            CourseType::Practical => "Practical",
        }
    }

    pub fn parse(raw: &str) -> Option<CourseType> {
        let t = raw.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(t))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseContext {
    pub date: NaiveDate,
    pub course_name: CourseName,
    pub course_type: CourseType,
    pub num_classes_held: u8,
}

impl CourseContext {
    pub fn new(
        date: NaiveDate,
        course_name: CourseName,
        course_type: CourseType,
        num_classes_held: u8,
    ) -> Result<CourseContext, AppError> {
        if !CLASSES_HELD.contains(&num_classes_held) {
            return Err(AppError::InvalidInput(format!(
                "classes held must be between {} and {}",
                CLASSES_HELD.start(),
                CLASSES_HELD.end()
            )));
        }
        Ok(CourseContext {
            date,
            course_name,
            course_type,
            num_classes_held,
        })
    }

    /// Parses the `course` object sent with an attendance render.
    pub fn from_json(v: &serde_json::Value) -> Result<CourseContext, AppError> {
        let field = |key: &str| {
            v.get(key)
                .and_then(|x| x.as_str())
                .ok_or_else(|| AppError::InvalidInput(format!("missing course.{}", key)))
        };

        let date_raw = field("date")?;
        let date = NaiveDate::parse_from_str(date_raw.trim(), DATE_INPUT_FORMAT).map_err(|_| {
            AppError::InvalidInput(format!("course.date must be YYYY-MM-DD, got {}", date_raw))
        })?;
        let name_raw = field("courseName")?;
        let course_name = CourseName::parse(name_raw)
            .ok_or_else(|| AppError::InvalidInput(format!("unknown course: {}", name_raw)))?;
        let type_raw = field("courseType")?;
        let course_type = CourseType::parse(type_raw).ok_or_else(|| {
            AppError::InvalidInput(format!("courseType must be Theory or Practical, got {}", type_raw))
        })?;
        let held = v
            .get("classesHeld")
            .and_then(|x| x.as_u64())
            .ok_or_else(|| AppError::InvalidInput("missing course.classesHeld".to_string()))?;
        let held = u8::try_from(held).unwrap_or(u8::MAX);

        CourseContext::new(date, course_name, course_type, held)
    }

    pub fn display_date(&self) -> String {
        self.date.format(DATE_DISPLAY_FORMAT).to_string()
    }

    pub fn heading(&self) -> String {
        format!("{} ({})", self.course_name.label(), self.course_type.label())
    }
}
