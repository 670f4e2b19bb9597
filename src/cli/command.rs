use chrono::NaiveDate;
use clap::Subcommand;

/// One service operation per subcommand; results are printed as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create a student with no marks
    AddStudent { id: i64, phone: String },
    /// Append a mark to a student
    AddMark { id: i64, subject: String, score: i32, date: NaiveDate },
    /// Replace a student's phone number
    UpdatePhone { id: i64, phone: String },
    /// Delete a student and print its last state
    Remove { id: i64 },
    /// Print a student's id and phone
    Get { id: i64 },
    /// Print a student's marks
    Marks { id: i64 },
    /// Find the student with exactly this phone
    ByPhone { phone: String },
    /// Students whose phone starts with the prefix
    ByPhonePrefix { prefix: String },
    /// Students with a mark on the date
    MarksOnDate { date: NaiveDate },
    /// Students with a mark in the month
    MarksInMonth { month: u32, year: i32 },
    /// Students with a mark in the subject above the threshold
    GoodSubjectMark { subject: String, threshold: i32 },
    /// Students whose every mark is above the threshold
    AllGoodMarks { threshold: i32 },
    /// Students whose every mark in the subject is above the threshold
    AllGoodMarksSubject { subject: String, threshold: i32 },
    /// Students with fewer marks than the given number
    FewMarks { n_marks: usize },
    /// Students whose mark count lies in [min, max]
    MarksAmountBetween { min: usize, max: usize },
    /// A student's marks in one subject
    MarksSubject { id: i64, subject: String },
    /// A student's marks dated within [from, to]
    MarksAtDates { id: i64, from: NaiveDate, to: NaiveDate },
    /// Students with an average score above the threshold
    AvgScoreGreater { threshold: i32 },
    /// Ids of the students with the most high marks
    Best { n: usize },
    /// Ids of the students with the lowest total score
    Worst { n: usize },
    /// Compact the operation log
    Checkpoint,
}
