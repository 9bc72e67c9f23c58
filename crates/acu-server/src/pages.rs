//! Page bodies. Each function returns the content placed inside
//! [`templates::layout`].

use acu_auth::LoginState;
use acu_core::{HomeworkKind, SubmissionStatus};
use acu_store::{
    AcademicPeriod, Class, Homework, Staff, Stream, Student, Subject, Submission, TeachingAssignmentRow,
    Term,
};
use chrono::{DateTime, Utc};

use crate::access::Viewer;
use crate::templates::{
    self, badge, button, card, checkboxes, empty_state, esc, input, link, select, table,
};

fn form(action: &str, fields: &str, submit: &str) -> String {
    format!(
        r#"<form method="post" action="{action}" class="space-y-4">{fields}<div>{}</div></form>"#,
        button(submit, "primary")
    )
}

fn hidden(name: &str, value: &str) -> String {
    format!(r#"<input type="hidden" name="{name}" value="{}">"#, esc(value))
}

fn textarea(name: &str, label: &str, value: &str) -> String {
    format!(
        r##"<div class="space-y-1">
            <label for="{name}" class="block text-sm font-medium text-gray-700">{label}</label>
            <textarea name="{name}" id="{name}" rows="4" class="w-full px-4 py-2 border border-gray-300 rounded-lg">{}</textarea>
        </div>"##,
        esc(value)
    )
}

fn choices<T>(items: &[T], selected: Option<i64>, f: impl Fn(&T) -> (i64, String)) -> Vec<(String, String, bool)> {
    items
        .iter()
        .map(|item| {
            let (id, label) = f(item);
            (id.to_string(), label, selected == Some(id))
        })
        .collect()
}

fn when(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

// =============================================================================
// Login
// =============================================================================

pub fn login_page(state: &LoginState, next: &str) -> String {
    let next = hidden("next", next);
    let body = match state {
        LoginState::EmailEntry => form(
            "/login/",
            &format!("{next}{}", input("email", "Email address", "email", "")),
            "Continue",
        ),
        LoginState::PasswordEntry { email } => {
            let fields = format!(
                r#"{next}<p class="text-gray-700">Signing in as <strong>{}</strong></p>{}"#,
                esc(email),
                input("password", "Password", "password", "")
            );
            format!(
                r#"{}<p class="mt-4 text-sm">{}</p>"#,
                form("/login/", &fields, "Log in"),
                link("/login/?reset=true", "Not you? Use another email")
            )
        }
        LoginState::CreatePassword { email, role, .. } => {
            let fields = format!(
                r#"{next}<p class="text-gray-700">Welcome, {}! Choose a password for <strong>{}</strong>.</p>{}{}"#,
                role.title(),
                esc(email),
                input("password", "Password", "password", ""),
                input("confirm_password", "Confirm password", "password", "")
            );
            format!(
                r#"{}<p class="mt-4 text-sm">{}</p>"#,
                form("/login/", &fields, "Create password"),
                link("/login/?reset=true", "Start over")
            )
        }
    };
    format!(r#"<div class="max-w-md mx-auto">{}</div>"#, card("Log in", &body))
}

// =============================================================================
// Home
// =============================================================================

pub struct HomeStats {
    pub staff: usize,
    pub students: usize,
    pub streams: usize,
    pub period: Option<AcademicPeriod>,
}

pub fn home_page(viewer: &Viewer, stats: &HomeStats, teaching: &[TeachingAssignmentRow]) -> String {
    let period = stats
        .period
        .as_ref()
        .map(|p| esc(&p.name))
        .unwrap_or_else(|| "not set".to_string());
    let greeting = format!(
        r#"<h1 class="text-2xl font-bold">Welcome, {}</h1><p class="text-gray-600">Academic year: {period}</p>"#,
        esc(&viewer.display_name())
    );

    let summary = if viewer.can_manage() {
        card(
            "School at a glance",
            &table(
                &["Staff", "Students", "Streams"],
                &[vec![
                    stats.staff.to_string(),
                    stats.students.to_string(),
                    stats.streams.to_string(),
                ]],
            ),
        )
    } else {
        String::new()
    };

    let classes = if viewer.staff.is_some() {
        card("My classes", &assignment_table(teaching))
    } else {
        String::new()
    };

    format!("{greeting}{summary}{classes}")
}

fn assignment_table(rows: &[TeachingAssignmentRow]) -> String {
    if rows.is_empty() {
        return empty_state("No teaching assignments", "Nothing has been assigned yet.", None);
    }
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                esc(&r.staff_name),
                esc(&r.subject_name),
                esc(&r.stream_label),
                esc(&r.period_name),
            ]
        })
        .collect();
    table(&["Teacher", "Subject", "Stream", "Year"], &rows)
}

// =============================================================================
// Staff
// =============================================================================

pub fn staff_list_page(staff: &[Staff]) -> String {
    if staff.is_empty() {
        return card(
            "Staff",
            &empty_state("No staff yet", "Register the first staff member.", Some(("Register staff", "/register_staff/"))),
        );
    }
    let rows: Vec<Vec<String>> = staff
        .iter()
        .map(|s| {
            vec![
                esc(&s.full_name()),
                esc(&s.email),
                esc(&s.position),
                esc(&s.department),
                format!(
                    "{} · {}",
                    link(&format!("/staff/{}/edit/", s.id), "Edit"),
                    link(&format!("/staff/{}/delete/", s.id), "Delete")
                ),
            ]
        })
        .collect();
    card(
        "Staff",
        &format!(
            "{}<p class=\"mt-4\">{}</p>",
            table(&["Name", "Email", "Position", "Department", ""], &rows),
            link("/register_staff/", "Register staff")
        ),
    )
}

pub fn staff_form_page(action: &str, staff: Option<&Staff>, chosen: &[i64], subjects: &[Subject]) -> String {
    let gender = staff.map(|s| s.gender.as_str());
    let options: Vec<(i64, String, bool)> = subjects
        .iter()
        .map(|s| (s.id, s.name.clone(), chosen.contains(&s.id)))
        .collect();

    let fields = [
        input("first_name", "First name", "text", staff.map_or("", |s| s.first_name.as_str())),
        input("last_name", "Last name", "text", staff.map_or("", |s| s.last_name.as_str())),
        input("email", "Email", "email", staff.map_or("", |s| s.email.as_str())),
        gender_select(gender),
        input("position", "Position", "text", staff.map_or("", |s| s.position.as_str())),
        input("department", "Department", "text", staff.map_or("", |s| s.department.as_str())),
        input("address", "Address", "text", staff.map_or("", |s| s.address.as_str())),
        input("phone", "Phone number", "tel", staff.and_then(|s| s.phone.as_deref()).unwrap_or("")),
        checkboxes("specializations", "Subject specialization", &options),
    ]
    .concat();

    let title = if staff.is_some() { "Edit staff" } else { "Register staff" };
    card(title, &form(action, &fields, "Save"))
}

fn gender_select(current: Option<&str>) -> String {
    select(
        "gender",
        "Gender",
        &[
            ("M".to_string(), "Male".to_string(), current == Some("M")),
            ("F".to_string(), "Female".to_string(), current == Some("F")),
        ],
    )
}

pub fn confirm_delete_page(what: &str, action: &str, cancel: &str) -> String {
    card(
        "Confirm delete",
        &format!(
            r#"<p class="mb-4">Are you sure you want to delete <strong>{}</strong>?</p>
            <form method="post" action="{action}" class="flex gap-4 items-center">{}{}</form>"#,
            esc(what),
            button("Delete", "danger"),
            link(cancel, "Cancel")
        ),
    )
}

// =============================================================================
// Students
// =============================================================================

pub fn student_list_page(students: &[Student], streams: &[Stream]) -> String {
    if students.is_empty() {
        return card(
            "Students",
            &empty_state("No students yet", "Register the first student.", Some(("Register student", "/register_student/"))),
        );
    }
    let stream_label = |id: i64| {
        streams
            .iter()
            .find(|s| s.id == id)
            .map(Stream::label)
            .unwrap_or_default()
    };
    let rows: Vec<Vec<String>> = students
        .iter()
        .map(|s| {
            vec![
                esc(&s.admission_number),
                esc(&s.full_name()),
                esc(s.email.as_deref().unwrap_or("")),
                esc(&stream_label(s.stream_id)),
                format!(
                    "{} · {}",
                    link(&format!("/students/{}/edit/", s.id), "Edit"),
                    link(&format!("/students/{}/delete/", s.id), "Delete")
                ),
            ]
        })
        .collect();
    card(
        "Students",
        &format!(
            "{}<p class=\"mt-4\">{}</p>",
            table(&["Admission No.", "Name", "Email", "Stream", ""], &rows),
            link("/register_student/", "Register student")
        ),
    )
}

pub fn student_form_page(action: &str, student: Option<&Student>, classes: &[Class], streams: &[Stream]) -> String {
    let fields = [
        input("admission_number", "Admission number", "text", student.map_or("", |s| s.admission_number.as_str())),
        input("first_name", "First name", "text", student.map_or("", |s| s.first_name.as_str())),
        input("last_name", "Last name", "text", student.map_or("", |s| s.last_name.as_str())),
        input("email", "Email", "email", student.and_then(|s| s.email.as_deref()).unwrap_or("")),
        gender_select(student.map(|s| s.gender.as_str())),
        select(
            "class",
            "Class",
            &choices(classes, student.map(|s| s.class_id), |c| (c.id, c.name.clone())),
        ),
        select(
            "stream",
            "Stream",
            &choices(streams, student.map(|s| s.stream_id), |s| (s.id, s.label())),
        ),
        input("address", "Address", "text", student.map_or("", |s| s.address.as_str())),
        input("phone", "Phone number", "tel", student.and_then(|s| s.phone.as_deref()).unwrap_or("")),
    ]
    .concat();

    let title = if student.is_some() { "Edit student" } else { "Register student" };
    card(title, &form(action, &fields, "Save"))
}

// =============================================================================
// Teaching assignments
// =============================================================================

pub struct AssignStreamView<'a> {
    pub staff: &'a [Staff],
    pub streams: &'a [Stream],
    pub selected_staff: Option<i64>,
    pub selected_stream: Option<i64>,
    pub eligible: &'a [Subject],
    pub assignments: &'a [TeachingAssignmentRow],
}

pub fn assign_stream_page(view: &AssignStreamView<'_>) -> String {
    let subjects = if view.selected_staff.is_some() && view.selected_stream.is_some() {
        if view.eligible.is_empty() {
            r#"<p id="subjects" class="text-gray-500">This teacher has no specializations offered to that stream's class.</p>"#
                .to_string()
        } else {
            let options: Vec<(i64, String, bool)> =
                view.eligible.iter().map(|s| (s.id, s.name.clone(), false)).collect();
            checkboxes("subjects", "Subjects", &options)
        }
    } else {
        r#"<p id="subjects" class="text-gray-500">Choose a teacher and a stream to see the subjects they can teach.</p>"#
            .to_string()
    };

    let fields = format!(
        "{}{}{}",
        select(
            "staff",
            "Staff",
            &choices(view.staff, view.selected_staff, |s| (s.id, s.full_name())),
        ),
        select(
            "stream",
            "Stream",
            &choices(view.streams, view.selected_stream, |s| (s.id, s.label())),
        ),
        subjects
    );

    // Re-filter subjects whenever either select changes.
    let script = r#"<script>
        (function () {
            const staff = document.getElementById('staff');
            const stream = document.getElementById('stream');
            function refresh() {
                if (!staff.value || !stream.value) return;
                window.location.search = '?staff=' + staff.value + '&stream=' + stream.value;
            }
            staff.addEventListener('change', refresh);
            stream.addEventListener('change', refresh);
        })();
    </script>"#;

    format!(
        "{}{}{script}",
        card("Assign stream", &form("/assign-stream/", &fields, "Assign")),
        card("Current assignments", &assignment_table(view.assignments))
    )
}

// =============================================================================
// Academics
// =============================================================================

pub struct AcademicsView<'a> {
    pub classes: &'a [Class],
    pub streams: &'a [Stream],
    pub subjects: &'a [Subject],
    pub periods: &'a [AcademicPeriod],
    pub terms: &'a [Term],
}

pub fn academics_page(view: &AcademicsView<'_>) -> String {
    let class_name = |id: i64| {
        view.classes
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    };

    let classes = format!(
        "{}{}",
        table(
            &["Class"],
            &view.classes.iter().map(|c| vec![esc(&c.name)]).collect::<Vec<_>>()
        ),
        form("/academics/classes/", &input("name", "Class name", "text", ""), "Add class")
    );

    let class_choices = choices(view.classes, None, |c| (c.id, c.name.clone()));
    let streams = format!(
        "{}{}",
        table(
            &["Stream"],
            &view.streams.iter().map(|s| vec![esc(&s.label())]).collect::<Vec<_>>()
        ),
        form(
            "/academics/streams/",
            &format!("{}{}", select("class", "Class", &class_choices), input("name", "Stream name", "text", "")),
            "Add stream"
        )
    );

    let subjects = format!(
        "{}{}",
        table(
            &["Subject", "Class"],
            &view
                .subjects
                .iter()
                .map(|s| vec![esc(&s.name), esc(&class_name(s.class_id))])
                .collect::<Vec<_>>()
        ),
        form(
            "/academics/subjects/",
            &format!("{}{}", select("class", "Class", &class_choices), input("name", "Subject name", "text", "")),
            "Add subject"
        )
    );

    let periods = format!(
        "{}{}",
        table(
            &["Year", "Starts", "Ends", ""],
            &view
                .periods
                .iter()
                .map(|p| {
                    vec![
                        esc(&p.name),
                        p.start_date.to_string(),
                        p.end_date.to_string(),
                        if p.is_current { badge("current", "green") } else { String::new() },
                    ]
                })
                .collect::<Vec<_>>()
        ),
        form(
            "/academics/periods/",
            &format!(
                r#"{}{}{}<label class="flex items-center gap-2"><input type="checkbox" name="is_current"> Current year</label>"#,
                input("name", "Year name", "text", ""),
                input("start_date", "Start date", "date", ""),
                input("end_date", "End date", "date", "")
            ),
            "Add year"
        )
    );

    let period_choices = choices(view.periods, None, |p| (p.id, p.name.clone()));
    let terms = format!(
        "{}{}",
        table(
            &["Term", "Starts", "Ends"],
            &view
                .terms
                .iter()
                .map(|t| vec![esc(&t.name), t.start_date.to_string(), t.end_date.to_string()])
                .collect::<Vec<_>>()
        ),
        form(
            "/academics/terms/",
            &format!(
                r#"{}{}{}{}<label class="flex items-center gap-2"><input type="checkbox" name="is_current"> Current term</label>"#,
                select("period", "Academic year", &period_choices),
                input("name", "Term name", "text", ""),
                input("start_date", "Start date", "date", ""),
                input("end_date", "End date", "date", "")
            ),
            "Add term"
        )
    );

    [
        card("Classes", &classes),
        card("Streams", &streams),
        card("Subjects", &subjects),
        card("Academic years", &periods),
        card("Terms", &terms),
    ]
    .concat()
}

// =============================================================================
// Homework
// =============================================================================

/// Homework with the names needed to display it.
pub struct HomeworkRow {
    pub homework: Homework,
    pub subject: String,
    pub stream: String,
    pub submission: Option<Submission>,
}

fn status_badge(status: SubmissionStatus) -> String {
    let color = match status {
        SubmissionStatus::NotStarted | SubmissionStatus::InProgress => "gray",
        SubmissionStatus::Submitted => "blue",
        SubmissionStatus::Late => "yellow",
        SubmissionStatus::Graded => "green",
    };
    badge(status.label(), color)
}

fn due_cell(hw: &Homework, now: DateTime<Utc>) -> String {
    if hw.is_overdue(now) {
        format!("{} {}", when(hw.due_at), badge("overdue", "red"))
    } else {
        format!("{} ({} days left)", when(hw.due_at), hw.days_remaining(now))
    }
}

pub fn staff_homework_page(
    rows: &[HomeworkRow],
    teaching: &[TeachingAssignmentRow],
    terms: &[Term],
    now: DateTime<Utc>,
) -> String {
    let list = if rows.is_empty() {
        empty_state("No homework yet", "Homework you set appears here.", None)
    } else {
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|r| {
                let active = if r.homework.is_active { "" } else { " (withdrawn)" };
                vec![
                    format!(
                        "{}{active}",
                        link(&format!("/homework/{}/", r.homework.id), &r.homework.title)
                    ),
                    esc(r.homework.kind().label()),
                    esc(&r.subject),
                    esc(&r.stream),
                    due_cell(&r.homework, now),
                ]
            })
            .collect();
        table(&["Title", "Kind", "Subject", "Stream", "Due"], &rows)
    };

    let new_form = if teaching.is_empty() {
        r#"<p class="text-gray-500">You can set homework once you have been assigned a subject and stream.</p>"#
            .to_string()
    } else {
        let mut subjects: Vec<(String, String, bool)> = Vec::new();
        let mut streams: Vec<(String, String, bool)> = Vec::new();
        for t in teaching {
            let s = (t.subject_id.to_string(), t.subject_name.clone(), false);
            if !subjects.contains(&s) {
                subjects.push(s);
            }
            let st = (t.stream_id.to_string(), t.stream_label.clone(), false);
            if !streams.contains(&st) {
                streams.push(st);
            }
        }
        let kinds: Vec<(String, String, bool)> = HomeworkKind::ALL
            .iter()
            .map(|k| (k.as_str().to_string(), k.label().to_string(), *k == HomeworkKind::Homework))
            .collect();
        let terms = choices(terms, None, |t| (t.id, t.name.clone()));
        let fields = [
            input("title", "Title", "text", ""),
            textarea("description", "Description", ""),
            select("kind", "Kind", &kinds),
            select("subject", "Subject", &subjects),
            select("stream", "Stream", &streams),
            select("term", "Term", &terms),
            input("total_marks", "Total marks", "number", "0"),
            input("due_at", "Due", "datetime-local", ""),
        ]
        .concat();
        form("/homework/", &fields, "Set homework")
    };

    format!("{}{}", card("Homework I have set", &list), card("New homework", &new_form))
}

pub fn student_homework_page(rows: &[HomeworkRow], now: DateTime<Utc>) -> String {
    if rows.is_empty() {
        return card("Homework", &empty_state("Nothing due", "No homework has been set for your stream.", None));
    }
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            let status = r
                .submission
                .as_ref()
                .map(Submission::status)
                .unwrap_or(SubmissionStatus::NotStarted);
            vec![
                link(&format!("/homework/{}/", r.homework.id), &r.homework.title),
                esc(&r.subject),
                due_cell(&r.homework, now),
                status_badge(status),
            ]
        })
        .collect();
    card("Homework", &table(&["Title", "Subject", "Due", "Status"], &rows))
}

fn homework_header(row: &HomeworkRow, now: DateTime<Utc>) -> String {
    let hw = &row.homework;
    format!(
        r#"<p class="text-gray-600">{} · {} · {} · out of {}</p><p class="mt-2">Due {}</p><div class="mt-4 whitespace-pre-line">{}</div>"#,
        esc(hw.kind().label()),
        esc(&row.subject),
        esc(&row.stream),
        hw.total_marks,
        due_cell(hw, now),
        esc(&hw.description)
    )
}

/// The author's view: every hand-in with a grading form.
pub fn homework_review_page(row: &HomeworkRow, submissions: &[(Submission, String)], now: DateTime<Utc>) -> String {
    let hw = &row.homework;
    let list = if submissions.is_empty() {
        empty_state("No submissions yet", "Students' work appears here once handed in.", None)
    } else {
        let rows: Vec<Vec<String>> = submissions
            .iter()
            .map(|(s, student)| {
                let grade = match (s.marks, s.letter_grade(hw.total_marks)) {
                    (Some(m), Some(g)) => format!("{m} ({g})"),
                    (Some(m), None) => m.to_string(),
                    _ => String::new(),
                };
                let grade_form = format!(
                    r#"<form method="post" action="/submissions/{}/grade/" class="flex gap-2">
                        <input type="number" step="0.5" name="marks" class="w-20 px-2 border rounded" value="{}">
                        <input type="text" name="remarks" class="px-2 border rounded" placeholder="Remarks" value="{}">
                        {}</form>"#,
                    s.id,
                    s.marks.map(|m| m.to_string()).unwrap_or_default(),
                    esc(s.remarks.as_deref().unwrap_or("")),
                    button("Grade", "primary")
                );
                vec![
                    esc(student),
                    s.submitted_at.map(when).unwrap_or_default(),
                    status_badge(s.status()),
                    esc(s.body.as_deref().unwrap_or("")),
                    grade,
                    grade_form,
                ]
            })
            .collect();
        table(&["Student", "Handed in", "Status", "Answer", "Marks", ""], &rows)
    };

    let withdraw = if hw.is_active {
        format!(
            r#"<form method="post" action="/homework/{}/deactivate/" class="mt-4">{}</form>"#,
            hw.id,
            button("Withdraw", "danger")
        )
    } else {
        String::new()
    };

    format!(
        "{}{}",
        card(&hw.title, &format!("{}{withdraw}", homework_header(row, now))),
        card("Submissions", &list)
    )
}

/// A student's view: the task and their hand-in.
pub fn homework_submit_page(row: &HomeworkRow, now: DateTime<Utc>) -> String {
    let hw = &row.homework;
    let mine = match &row.submission {
        Some(s) if s.status() == SubmissionStatus::Graded => {
            let grade = s
                .letter_grade(hw.total_marks)
                .map(|g| format!(" ({g})"))
                .unwrap_or_default();
            format!(
                r#"<p>{} Marks: {}{grade}</p><p class="mt-2">{}</p>"#,
                status_badge(s.status()),
                s.marks.map(|m| m.to_string()).unwrap_or_default(),
                esc(s.remarks.as_deref().unwrap_or(""))
            )
        }
        _ => {
            let current = row.submission.as_ref();
            let body = current.and_then(|s| s.body.as_deref()).unwrap_or("");
            let status = current
                .map(Submission::status)
                .unwrap_or(SubmissionStatus::NotStarted);
            format!(
                "<p class=\"mb-4\">{}</p>{}",
                status_badge(status),
                form(
                    &format!("/homework/{}/submit/", hw.id),
                    &textarea("body", "Your answer", body),
                    "Hand in"
                )
            )
        }
    };

    format!(
        "{}{}",
        card(&hw.title, &homework_header(row, now)),
        card("My work", &mine)
    )
}

/// Full HTML document for the login page, which has no viewer.
pub fn login_document(state: &LoginState, next: &str, flashes: &[acu_auth::Flash]) -> String {
    templates::layout("Log in", None, flashes, &login_page(state, next))
}
