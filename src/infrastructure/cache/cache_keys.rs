pub fn group_balances_key(group_id: &str) -> String {
    format!("balances:group:{}", group_id)
}
