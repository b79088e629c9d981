//! Catalog queries computed over a [`Snapshot`] with in-memory joins.
//!
//! Grouping follows a fixed convention: groups keyed by a name come out in
//! name order, and "pick the maximum" keeps the first group that reaches it.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::settings::label_matches;
use crate::{CatalogSettings, Snapshot};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AverageSalary {
    pub employee_id: i32,
    pub name: Option<String>,
    pub average_salary: f64,
}

/// Query 6: employee with the highest mean salary across their history.
///
/// The name is looked up by identifier. Older reports took the row at
/// position `id - 1`; when that row is a different employee a warning is
/// logged so the data can be checked.
pub fn highest_average_salary(snapshot: &Snapshot) -> Option<AverageSalary> {
    let mut totals: BTreeMap<i32, (f64, u32)> = BTreeMap::new();
    for entry in &snapshot.salary_history {
        if let (Some(employee_id), Some(salary)) = (entry.employee_id, entry.salary) {
            let total = totals.entry(employee_id).or_default();
            total.0 += salary;
            total.1 += 1;
        }
    }

    let (employee_id, average_salary) = first_max(
        totals
            .into_iter()
            .map(|(id, (sum, count))| (id, sum / f64::from(count))),
    )?;

    let name = snapshot
        .employees
        .iter()
        .find(|e| e.employee_id == employee_id)
        .and_then(|e| e.name.clone());
    let positional = employee_id
        .checked_sub(1)
        .and_then(|idx| usize::try_from(idx).ok())
        .and_then(|idx| snapshot.employees.get(idx));
    if positional.is_some_and(|e| e.employee_id != employee_id) {
        warn!(
            employee_id,
            "employee rows are not ordered by identifier; positional lookup would pick someone else"
        );
    }

    Some(AverageSalary {
        employee_id,
        name,
        average_salary,
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NamedEmployee {
    pub employee_id: i32,
    pub name: Option<String>,
}

/// Query 7: male analysts with exactly two female dependents, in employee
/// order.
pub fn analysts_with_two_daughters(
    snapshot: &Snapshot,
    settings: &CatalogSettings,
) -> Vec<NamedEmployee> {
    let analyst_roles = role_ids(snapshot, &settings.analyst_role);
    let male_analysts = snapshot
        .employees
        .iter()
        .filter(|e| e.role_id.is_some_and(|r| analyst_roles.contains(&r)))
        .filter(|e| label_matches(e.gender.as_deref(), &settings.male_label))
        .map(|e| e.employee_id)
        .collect::<HashSet<_>>();

    let mut daughters: HashMap<i32, usize> = HashMap::new();
    for dependent in &snapshot.dependents {
        let Some(parent) = dependent.employee_id else {
            continue;
        };
        if male_analysts.contains(&parent)
            && label_matches(dependent.gender.as_deref(), &settings.female_label)
        {
            *daughters.entry(parent).or_default() += 1;
        }
    }

    snapshot
        .employees
        .iter()
        .filter(|e| daughters.get(&e.employee_id) == Some(&2))
        .map(|e| NamedEmployee {
            employee_id: e.employee_id,
            name: e.name.clone(),
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmployeeSalary {
    pub employee_id: i32,
    pub name: Option<String>,
    pub salary: f64,
}

/// Query 8: best-paid analyst whose salary lies inside the configured band.
pub fn top_paid_analyst_in_band(
    snapshot: &Snapshot,
    settings: &CatalogSettings,
) -> Option<EmployeeSalary> {
    let analyst_roles = role_ids(snapshot, &settings.analyst_role);
    let band = settings.analyst_salary_min..=settings.analyst_salary_max;
    let (employee, salary) = first_max(
        snapshot
            .employees
            .iter()
            .filter(|e| e.role_id.is_some_and(|r| analyst_roles.contains(&r)))
            .filter_map(|e| e.salary.filter(|s| band.contains(s)).map(|s| (e, s))),
    )?;
    Some(EmployeeSalary {
        employee_id: employee.employee_id,
        name: employee.name.clone(),
        salary,
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DepartmentCount {
    pub department: String,
    pub dependents: usize,
}

/// Query 9: department whose employees have the most dependents.
///
/// Every employee with a resolvable department contributes its department,
/// even with no dependents, so a dataset without dependents yields the first
/// department by name with a count of zero. `None` only when no employee
/// belongs to a known department.
pub fn department_with_most_dependents(snapshot: &Snapshot) -> Option<DepartmentCount> {
    let departments = snapshot.departments_by_id();
    let mut per_employee: HashMap<i32, usize> = HashMap::new();
    for dependent in &snapshot.dependents {
        if let Some(parent) = dependent.employee_id {
            *per_employee.entry(parent).or_default() += 1;
        }
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for employee in &snapshot.employees {
        let Some(name) = employee
            .department_id
            .and_then(|id| departments.get(&id))
            .and_then(|d| d.department_name.as_deref())
        else {
            continue;
        };
        *counts.entry(name).or_default() +=
            per_employee.get(&employee.employee_id).copied().unwrap_or(0);
    }

    let (department, dependents) = first_max(counts)?;
    Some(DepartmentCount {
        department: department.to_string(),
        dependents,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DepartmentAverage {
    pub department: String,
    pub average_salary: f64,
}

/// Query 10: mean salary per department, highest first.
pub fn average_salary_by_department(snapshot: &Snapshot) -> Vec<DepartmentAverage> {
    let departments = snapshot.departments_by_id();
    let salaries = snapshot.employees.iter().filter_map(|e| {
        let name = department_name(&departments, e.department_id)?;
        Some((name, e.salary?))
    });
    let mut averages = mean_by_name(salaries)
        .into_iter()
        .map(|(department, average_salary)| DepartmentAverage {
            department,
            average_salary,
        })
        .collect::<Vec<_>>();
    averages.sort_by(|a, b| b.average_salary.total_cmp(&a.average_salary));
    averages
}

/// Query 11: mean salary of the employees responsible for completed
/// projects, per department. An employee counts once per completed project.
pub fn completed_project_salary_by_department(
    snapshot: &Snapshot,
    settings: &CatalogSettings,
) -> Vec<DepartmentAverage> {
    let employees = snapshot.employees_by_id();
    let departments = snapshot.departments_by_id();
    let salaries = snapshot
        .projects
        .iter()
        .filter(|p| label_matches(p.status.as_deref(), &settings.completed_status))
        .filter_map(|p| {
            let employee = employees.get(&p.employee_id?)?;
            let name = department_name(&departments, employee.department_id)?;
            Some((name, employee.salary?))
        });
    mean_by_name(salaries)
        .into_iter()
        .map(|(department, average_salary)| DepartmentAverage {
            department,
            average_salary,
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MaterialUsage {
    pub resource: String,
    pub quantity: i64,
}

/// Query 12: most-used material resources by summed quantity. Ties keep the
/// order in which resources first appear.
pub fn top_material_resources(
    snapshot: &Snapshot,
    settings: &CatalogSettings,
) -> Vec<MaterialUsage> {
    let mut usage: Vec<MaterialUsage> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for resource in &snapshot.project_resources {
        if !label_matches(resource.resource_type.as_deref(), &settings.material_type) {
            continue;
        }
        let Some(description) = resource.resource_description.as_deref() else {
            continue;
        };
        let slot = *index.entry(description).or_insert_with(|| {
            usage.push(MaterialUsage {
                resource: description.to_string(),
                quantity: 0,
            });
            usage.len() - 1
        });
        usage[slot].quantity += resource.quantity.unwrap_or(0);
    }
    usage.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    usage.truncate(settings.top_materials);
    usage
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DepartmentTotal {
    pub department: String,
    pub total_cost: f64,
}

/// Query 13: summed cost of completed projects per department of the
/// responsible employee.
pub fn completed_project_cost_by_department(
    snapshot: &Snapshot,
    settings: &CatalogSettings,
) -> Vec<DepartmentTotal> {
    let employees = snapshot.employees_by_id();
    let departments = snapshot.departments_by_id();
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for project in &snapshot.projects {
        if !label_matches(project.status.as_deref(), &settings.completed_status) {
            continue;
        }
        let Some(name) = project
            .employee_id
            .and_then(|id| employees.get(&id))
            .and_then(|e| department_name(&departments, e.department_id))
        else {
            continue;
        };
        *totals.entry(name).or_default() += project.cost.unwrap_or(0.0);
    }
    totals
        .into_iter()
        .map(|(department, total_cost)| DepartmentTotal {
            department,
            total_cost,
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectInExecution {
    pub project: String,
    pub cost: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub responsible: Option<String>,
}

/// Query 14: projects still being executed, with their responsible employee.
pub fn projects_in_execution(
    snapshot: &Snapshot,
    settings: &CatalogSettings,
) -> Vec<ProjectInExecution> {
    let employees = snapshot.employees_by_id();
    snapshot
        .projects
        .iter()
        .filter(|p| label_matches(p.status.as_deref(), &settings.in_execution_status))
        .filter_map(|p| {
            let employee = employees.get(&p.employee_id?)?;
            Some(ProjectInExecution {
                project: p.name.clone(),
                cost: p.cost,
                start_date: p.start_date,
                completion_date: p.completion_date,
                responsible: employee.name.clone(),
            })
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProjectDependents {
    pub project_id: i32,
    pub project: String,
    pub dependents: usize,
}

/// Query 15: project whose responsible employee has the largest family.
/// Projects whose employee has no dependents drop out of the join.
pub fn project_with_most_dependents(snapshot: &Snapshot) -> Option<ProjectDependents> {
    let employees = snapshot.employees_by_id();
    let mut per_employee: HashMap<i32, usize> = HashMap::new();
    for dependent in &snapshot.dependents {
        if let Some(parent) = dependent.employee_id {
            *per_employee.entry(parent).or_default() += 1;
        }
    }

    let mut counts: BTreeMap<i32, (&str, usize)> = BTreeMap::new();
    for project in &snapshot.projects {
        let Some(employee) = project.employee_id.and_then(|id| employees.get(&id)) else {
            continue;
        };
        let Some(&family) = per_employee.get(&employee.employee_id) else {
            continue;
        };
        counts.insert(project.project_id, (project.name.as_str(), family));
    }

    let ((project_id, project), dependents) = first_max(
        counts
            .into_iter()
            .map(|(id, (name, family))| ((id, name), family)),
    )?;
    Some(ProjectDependents {
        project_id,
        project: project.to_string(),
        dependents,
    })
}

fn role_ids(snapshot: &Snapshot, description: &str) -> HashSet<i32> {
    snapshot
        .roles
        .iter()
        .filter(|r| label_matches(r.description.as_deref(), description))
        .map(|r| r.role_id)
        .collect()
}

fn department_name(
    departments: &HashMap<i32, &entity::department::Model>,
    department_id: Option<i32>,
) -> Option<String> {
    departments
        .get(&department_id?)
        .and_then(|d| d.department_name.clone())
}

/// Mean of the values per name, in name order.
fn mean_by_name(values: impl Iterator<Item = (String, f64)>) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, u32)> = BTreeMap::new();
    for (name, value) in values {
        let entry = sums.entry(name).or_default();
        entry.0 += value;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(name, (sum, count))| (name, sum / f64::from(count)))
        .collect()
}

/// First pair holding the largest value; later ties lose.
fn first_max<K, V: PartialOrd>(pairs: impl IntoIterator<Item = (K, V)>) -> Option<(K, V)> {
    let mut best: Option<(K, V)> = None;
    for (key, value) in pairs {
        match &best {
            Some((_, current)) if *current >= value => {}
            _ => best = Some((key, value)),
        }
    }
    best
}
