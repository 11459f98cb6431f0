use xrepl_core::{format_size, TableDescriptor, XreplConfig};

use super::open_session;

pub async fn list(config: XreplConfig, group: &str, search: Option<&str>) -> anyhow::Result<()> {
    let (mut session, _notifications) = open_session(&config, group).await?;
    if let Some(query) = search {
        session.set_search(query);
    }

    let group = session.group();
    println!(
        "Group {} ({}): {} member tables, source {}",
        group.name,
        group.id,
        group.member_table_ids.len(),
        group.source_cluster_id
    );

    let rows = session.visible();
    if rows.is_empty() {
        println!("No eligible tables.");
    } else {
        print!("{}", format_rows(&rows));
    }

    session.close();
    Ok(())
}

fn format_rows(rows: &[TableDescriptor]) -> String {
    let mut out = format!(
        "{:<38} {:<28} {:<5} {:<16} {:>10}\n",
        "ID", "NAME", "TYPE", "KEYSPACE", "SIZE"
    );
    for t in rows {
        out.push_str(&format!(
            "{:<38} {:<28} {:<5} {:<16} {:>10}\n",
            t.id,
            t.name,
            t.table_type.label(),
            t.keyspace,
            format_size(t.size_bytes)
        ));
    }
    out
}
