use adtechmedia_http::{
    AdtechmediaClient, AtmError, MemoryStore, NewProperty, OffsetType, PledgedType,
    PluginSettings, PrefixedStore, PropertyConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let end_point = std::env::var("ADTECHMEDIA_API_END_POINT")?;
    let email = std::env::var("ADTECHMEDIA_EMAIL")?;

    let mut store = PrefixedStore::new(MemoryStore::new(), "Adtechmedia_");
    let mut settings = PluginSettings::load(&store);

    if settings.api_key.is_none() {
        match AdtechmediaClient::new(end_point.as_str()).api_key_create(&email).await {
            Ok(key) => settings.api_key = Some(key),
            Err(AtmError::AccountExists { message, .. }) => {
                println!("{message}");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }
    }

    let atm = settings.client(end_point.as_str());
    let build = atm
        .property_create(&NewProperty {
            name: "example-blog".to_owned(),
            website: "https://blog.example".to_owned(),
            support_email: email.clone(),
            country: "US".to_owned(),
        })
        .await?;
    settings.apply_build(build);

    let property_id = settings.property_id.clone().unwrap_or_default();
    let build = atm
        .property_update_config(
            &property_id,
            &PropertyConfig {
                container: "article".to_owned(),
                selector: "p".to_owned(),
                price: 0.05,
                ads_video: String::new(),
                content_offset: 2,
                content_lock: "blur+scramble".to_owned(),
                revenue_method: "micropayments".to_owned(),
                payment_pledged: 2,
                offset_type: OffsetType::Paragraphs,
                currency: "usd".to_owned(),
                pledged_type: PledgedType::Transactions,
                target_cb_js: String::new(),
                toggle_cb_js: String::new(),
            },
        )
        .await?;
    settings.apply_build(build);
    settings.save(&mut store);

    println!(
        "property {} built at {}",
        settings.property_id.as_deref().unwrap_or("-"),
        settings.build_path.as_deref().unwrap_or("-")
    );
    Ok(())
}
