pub fn render_schema() -> String {
	include_str!("../../../sql/init.sql").to_string()
}
