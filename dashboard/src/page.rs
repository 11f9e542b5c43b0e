use askama::Template;
use shared::DashboardView;

#[derive(Template)]
#[template(path = "dashboard.html", escape = "html")]
pub struct DashboardPage<'a> {
    pub view: &'a DashboardView,
    pub schedule_note: &'a str,
}

impl<'a> DashboardPage<'a> {
    pub fn new(view: &'a DashboardView, schedule_note: &'a str) -> Self {
        Self { view, schedule_note }
    }
}
