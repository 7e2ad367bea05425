use super::Repository;
use crate::{
    error::StoreError,
    models::{
        CourseRecord, CourseRequest, CreateStudentRequest, Department, EnrollmentRecord,
        StudentRecord, UpdateStudentRequest,
    },
};
use async_trait::async_trait;
use std::{
    collections::BTreeMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

#[derive(Debug, Clone)]
struct CourseRow {
    code: String,
    title: String,
    credits: i32,
    department_id: i32,
}

#[derive(Debug, Clone)]
struct StudentRow {
    student_number: String,
    name: String,
    total_credits: i32,
    department_id: Option<i32>,
}

/// Rows keyed by primary key. Relations are plain foreign-key fields resolved at read time,
/// so there are no back-references to keep in sync.
///
/// `course_seq` and `student_seq` hold the last id handed out. Like a serial column they
/// only move forward, so a deleted id is never reissued.
#[derive(Debug, Default)]
struct Tables {
    departments: BTreeMap<i32, Department>,
    courses: BTreeMap<i32, CourseRow>,
    students: BTreeMap<i32, StudentRow>,
    enrollments: BTreeMap<(i32, i32), Option<String>>,
    course_seq: i32,
    student_seq: i32,
}

impl Tables {
    fn course_record(&self, id: i32, row: &CourseRow) -> Option<CourseRecord> {
        let department = self.departments.get(&row.department_id)?;
        Some(CourseRecord {
            id,
            code: row.code.clone(),
            title: row.title.clone(),
            credits: row.credits,
            department_id: row.department_id,
            department_name: department.name.clone(),
        })
    }

    fn student_record(&self, id: i32, row: &StudentRow) -> StudentRecord {
        let department_name = row
            .department_id
            .and_then(|dept_id| self.departments.get(&dept_id))
            .map(|department| department.name.clone());

        StudentRecord {
            id,
            student_number: row.student_number.clone(),
            name: row.name.clone(),
            total_credits: row.total_credits,
            department_id: row.department_id,
            department_name,
        }
    }

    fn enrollment_record(
        &self,
        (student_id, course_id): (i32, i32),
        grade: &Option<String>,
    ) -> Option<EnrollmentRecord> {
        let course = self.courses.get(&course_id)?;
        Some(EnrollmentRecord {
            student_id,
            course_id,
            course_code: course.code.clone(),
            course_title: course.title.clone(),
            credits: course.credits,
            grade: grade.clone(),
        })
    }

    fn check_course(&self, id: Option<i32>, course: &CourseRequest) -> Result<(), StoreError> {
        if course.credits <= 0 {
            return Err(StoreError::CheckViolation("courses_credits_check".to_string()));
        }
        if !self.departments.contains_key(&course.department_id) {
            return Err(StoreError::ForeignKeyViolation(
                "courses_department_id_fkey".to_string(),
            ));
        }
        let duplicate = self
            .courses
            .iter()
            .any(|(other_id, other)| Some(*other_id) != id && other.code == course.code);
        if duplicate {
            return Err(StoreError::UniqueViolation("courses_code_key".to_string()));
        }
        Ok(())
    }

    fn check_affiliation(&self, department_id: Option<i32>) -> Result<(), StoreError> {
        match department_id {
            Some(dept_id) if !self.departments.contains_key(&dept_id) => Err(
                StoreError::ForeignKeyViolation("students_department_id_fkey".to_string()),
            ),
            _ => Ok(()),
        }
    }

    fn next_id(seq: &mut i32) -> i32 {
        *seq += 1;
        *seq
    }
}

/// InMemoryRepository
///
/// A `Repository` held entirely in process memory, with the same constraint and cascade
/// semantics as the Postgres schema. Used by the test-suite and for local runs without a
/// database. Not optimized for performance.
///
/// Every mutation runs its checks and its write under one write lock, so check-then-insert
/// is atomic here just as the unique index makes it in Postgres.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the same sample university as the initial migration:
    /// departments 1 "Biology" and 2 "Comp. Sci.", courses 4 "CS-101" and 5 "CS-190"
    /// (both in Comp. Sci.), students 1 "00128" and 2 "12345", and student 1 enrolled in
    /// CS-101 with grade "A".
    pub fn seeded() -> Self {
        let mut tables = Tables::default();

        for (id, name, building, budget) in [
            (1, "Biology", "Watson", 90_000.0),
            (2, "Comp. Sci.", "Taylor", 100_000.0),
        ] {
            tables.departments.insert(
                id,
                Department {
                    id,
                    name: name.to_string(),
                    building: building.to_string(),
                    budget,
                },
            );
        }

        for (id, code, title) in [
            (4, "CS-101", "Intro. to Computer Science"),
            (5, "CS-190", "Game Design"),
        ] {
            tables.courses.insert(
                id,
                CourseRow {
                    code: code.to_string(),
                    title: title.to_string(),
                    credits: 4,
                    department_id: 2,
                },
            );
        }

        for (id, number, name, total_credits) in
            [(1, "00128", "Zhang", 102), (2, "12345", "Shankar", 32)]
        {
            tables.students.insert(
                id,
                StudentRow {
                    student_number: number.to_string(),
                    name: name.to_string(),
                    total_credits,
                    department_id: Some(2),
                },
            );
        }

        tables.enrollments.insert((1, 4), Some("A".to_string()));
        // Sequences continue past the seeded ids, as in the migration.
        tables.course_seq = 5;
        tables.student_seq = 2;

        Self {
            tables: RwLock::new(tables),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_departments(&self) -> Result<Vec<Department>, StoreError> {
        Ok(self.read()?.departments.values().cloned().collect())
    }

    async fn get_department(&self, id: i32) -> Result<Option<Department>, StoreError> {
        Ok(self.read()?.departments.get(&id).cloned())
    }

    async fn delete_department(&self, id: i32) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        if tables.departments.remove(&id).is_none() {
            return Ok(false);
        }

        for student in tables.students.values_mut() {
            if student.department_id == Some(id) {
                student.department_id = None;
            }
        }

        let orphaned: Vec<i32> = tables
            .courses
            .iter()
            .filter(|(_, course)| course.department_id == id)
            .map(|(course_id, _)| *course_id)
            .collect();
        tables.courses.retain(|_, course| course.department_id != id);
        tables
            .enrollments
            .retain(|(_, course_id), _| !orphaned.contains(course_id));

        Ok(true)
    }

    async fn list_courses(&self) -> Result<Vec<CourseRecord>, StoreError> {
        let tables = self.read()?;
        let mut courses: Vec<CourseRecord> = tables
            .courses
            .iter()
            .filter_map(|(id, row)| tables.course_record(*id, row))
            .collect();
        courses.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(courses)
    }

    async fn get_course(&self, id: i32) -> Result<Option<CourseRecord>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .courses
            .get(&id)
            .and_then(|row| tables.course_record(id, row)))
    }

    async fn insert_course(&self, course: &CourseRequest) -> Result<i32, StoreError> {
        let mut tables = self.write()?;
        tables.check_course(None, course)?;

        let id = Tables::next_id(&mut tables.course_seq);
        tables.courses.insert(
            id,
            CourseRow {
                code: course.code.clone(),
                title: course.title.clone(),
                credits: course.credits,
                department_id: course.department_id,
            },
        );
        Ok(id)
    }

    async fn update_course(&self, id: i32, course: &CourseRequest) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        if !tables.courses.contains_key(&id) {
            return Ok(false);
        }
        tables.check_course(Some(id), course)?;

        if let Some(row) = tables.courses.get_mut(&id) {
            row.code = course.code.clone();
            row.title = course.title.clone();
            row.credits = course.credits;
            row.department_id = course.department_id;
        }
        Ok(true)
    }

    async fn delete_course(&self, id: i32) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        if tables.courses.remove(&id).is_none() {
            return Ok(false);
        }
        tables.enrollments.retain(|(_, course_id), _| *course_id != id);
        Ok(true)
    }

    async fn list_students(&self) -> Result<Vec<StudentRecord>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .students
            .iter()
            .map(|(id, row)| tables.student_record(*id, row))
            .collect())
    }

    async fn get_student(&self, id: i32) -> Result<Option<StudentRecord>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .students
            .get(&id)
            .map(|row| tables.student_record(id, row)))
    }

    async fn insert_student(&self, student: &CreateStudentRequest) -> Result<i32, StoreError> {
        let mut tables = self.write()?;
        tables.check_affiliation(student.department_id)?;
        if tables
            .students
            .values()
            .any(|other| other.student_number == student.student_number)
        {
            return Err(StoreError::UniqueViolation(
                "students_student_number_key".to_string(),
            ));
        }

        let id = Tables::next_id(&mut tables.student_seq);
        tables.students.insert(
            id,
            StudentRow {
                student_number: student.student_number.clone(),
                name: student.name.clone(),
                total_credits: 0,
                department_id: student.department_id,
            },
        );
        Ok(id)
    }

    async fn update_student(
        &self,
        id: i32,
        student: &UpdateStudentRequest,
    ) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        if !tables.students.contains_key(&id) {
            return Ok(false);
        }
        tables.check_affiliation(student.department_id)?;

        if let Some(row) = tables.students.get_mut(&id) {
            row.name = student.name.clone();
            row.department_id = student.department_id;
        }
        Ok(true)
    }

    async fn delete_student(&self, id: i32) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        if tables.students.remove(&id).is_none() {
            return Ok(false);
        }
        tables
            .enrollments
            .retain(|(student_id, _), _| *student_id != id);
        Ok(true)
    }

    async fn list_enrollments(&self, student_id: i32) -> Result<Vec<EnrollmentRecord>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .enrollments
            .range((student_id, i32::MIN)..=(student_id, i32::MAX))
            .filter_map(|(key, grade)| tables.enrollment_record(*key, grade))
            .collect())
    }

    async fn get_enrollment(
        &self,
        student_id: i32,
        course_id: i32,
    ) -> Result<Option<EnrollmentRecord>, StoreError> {
        let tables = self.read()?;
        let key = (student_id, course_id);
        Ok(tables
            .enrollments
            .get(&key)
            .and_then(|grade| tables.enrollment_record(key, grade)))
    }

    async fn insert_enrollment(&self, student_id: i32, course_id: i32) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if !tables.students.contains_key(&student_id) {
            return Err(StoreError::ForeignKeyViolation(
                "enrollments_student_id_fkey".to_string(),
            ));
        }
        if !tables.courses.contains_key(&course_id) {
            return Err(StoreError::ForeignKeyViolation(
                "enrollments_course_id_fkey".to_string(),
            ));
        }
        if tables.enrollments.contains_key(&(student_id, course_id)) {
            return Err(StoreError::UniqueViolation("enrollments_pkey".to_string()));
        }

        tables.enrollments.insert((student_id, course_id), None);
        Ok(())
    }

    async fn set_grade(
        &self,
        student_id: i32,
        course_id: i32,
        grade: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        match tables.enrollments.get_mut(&(student_id, course_id)) {
            Some(slot) => {
                *slot = grade.map(str::to_string);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_enrollment(&self, student_id: i32, course_id: i32) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        Ok(tables.enrollments.remove(&(student_id, course_id)).is_some())
    }
}
