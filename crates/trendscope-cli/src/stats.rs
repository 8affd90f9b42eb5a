//! Read-only `stats` command.

/// Print store totals and the `limit` most used tags.
///
/// # Errors
///
/// Returns an error if a database query fails.
pub(crate) async fn run_stats(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let totals = trendscope_db::aggregates(pool).await?;

    println!("posts:              {}", totals.total_posts);
    println!("comments:           {}", totals.total_comments);
    println!("tags:               {}", totals.total_tags);
    println!("avg likes/post:     {:.2}", totals.avg_likes_per_post);
    println!("avg comments/post:  {:.2}", totals.avg_comments_per_post);

    let tags = trendscope_db::top_tags(pool, limit).await?;
    if tags.is_empty() {
        println!("\nno tags stored yet; run `collect` first");
        return Ok(());
    }

    println!("\n{:<30}POSTS", "TAG");
    for row in &tags {
        println!("{:<30}{}", format!("#{}", row.tag), row.count);
    }

    Ok(())
}
