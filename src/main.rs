use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rocha_listings::admin::{FormError, PropertyForm};
use rocha_listings::api::{ApiClient, PropertyBackend, UserBackend};
use rocha_listings::cache::CacheStore;
use rocha_listings::catalog::{spawn_refresh, PropertyCatalog};
use rocha_listings::config::Config;
use rocha_listings::models::{ChangePassword, Property, PropertyDraft, RegisterUser, UserUpdate};
use rocha_listings::search::{self, Filters, SortOrder};
use rocha_listings::session::Session;
use rocha_listings::validation::{self, ContactForm};
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rocha-listings", about = "Browse and manage La Paloma real-estate listings")]
struct Cli {
    /// Listings backend, overrides the config file
    #[arg(long, env = "LISTINGS_BASE_URL", global = true)]
    base_url: Option<String>,

    #[arg(long, env = "LISTINGS_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter and sort the cached catalog
    Search(SearchArgs),
    /// Show one listing
    Show { id: i64 },
    /// Homepage selection
    Home,
    /// Drop the cache and fetch everything again
    Refresh,
    /// Keep the cache warm until interrupted
    Watch,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "LISTINGS_PASSWORD")]
        password: String,
    },
    Register(RegisterArgs),
    Logout,
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    ResetPassword {
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    Profile(ProfileCommand),
    /// Validate a contact message and print the WhatsApp link
    Contact(ContactArgs),
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct SearchArgs {
    #[arg(long, default_value = "")]
    text: String,
    /// Neighborhood slug or `cualquiera`
    #[arg(long, default_value = "")]
    location: String,
    /// Property type slug or `any`
    #[arg(long = "type", default_value = "")]
    property_type: String,
    #[arg(long)]
    rooms_min: Option<f64>,
    #[arg(long)]
    rooms_max: Option<f64>,
    #[arg(long)]
    baths_min: Option<f64>,
    #[arg(long)]
    baths_max: Option<f64>,
    #[arg(long)]
    garage: Option<bool>,
    #[arg(long)]
    pool: Option<bool>,
    #[arg(long)]
    price_min: Option<f64>,
    #[arg(long)]
    price_max: Option<f64>,
    #[arg(long)]
    area_min: Option<f64>,
    #[arg(long)]
    area_max: Option<f64>,
    #[arg(long)]
    land_min: Option<f64>,
    #[arg(long)]
    land_max: Option<f64>,
    /// One of date-desc, date-asc, price-asc, price-desc, area-desc, area-asc
    #[arg(long, default_value = "date-desc")]
    order: String,
}

impl SearchArgs {
    fn into_filters(self) -> Result<Filters> {
        let defaults = Filters::default();
        let order_by: SortOrder = self.order.parse()?;
        Ok(Filters {
            search_text: self.text,
            location: self.location,
            property_type: self.property_type,
            rooms_min: self.rooms_min.unwrap_or(defaults.rooms_min),
            rooms_max: self.rooms_max.unwrap_or(defaults.rooms_max),
            baths_min: self.baths_min.unwrap_or(defaults.baths_min),
            baths_max: self.baths_max.unwrap_or(defaults.baths_max),
            garage: self.garage,
            pool: self.pool,
            price_min: self.price_min.unwrap_or(defaults.price_min),
            price_max: self.price_max.unwrap_or(defaults.price_max),
            area_min: self.area_min.unwrap_or(defaults.area_min),
            area_max: self.area_max.unwrap_or(defaults.area_max),
            land_min: self.land_min.unwrap_or(defaults.land_min),
            land_max: self.land_max.unwrap_or(defaults.land_max),
            order_by,
        })
    }
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long, env = "LISTINGS_PASSWORD")]
    password: String,
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Args, Debug)]
struct ContactArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    subject: String,
    #[arg(long)]
    message: String,
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    Create(EditArgs),
    Update {
        id: i64,
        #[command(flatten)]
        edit: EditArgs,
    },
    Delete { id: i64 },
}

#[derive(Args, Debug)]
struct EditArgs {
    /// JSON file with the listing fields
    #[arg(long)]
    from: Option<PathBuf>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    pinned: Option<bool>,
    #[arg(long)]
    approved: Option<bool>,
    /// Local image to upload, repeatable
    #[arg(long = "image")]
    images: Vec<PathBuf>,
    /// Position of a shown image to remove, repeatable
    #[arg(long = "remove-image")]
    remove_images: Vec<usize>,
    /// Move a shown image, as `from:to`
    #[arg(long = "move")]
    moves: Vec<String>,
}

impl EditArgs {
    async fn apply(self, form: &mut PropertyForm) -> Result<()> {
        if let Some(path) = &self.from {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let draft: PropertyDraft = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid listing JSON in {}", path.display()))?;
            form.draft = PropertyDraft {
                image_src: form.draft.image_src.clone(),
                ..draft
            };
        }
        if let Some(title) = self.title {
            form.draft.title = title;
        }
        if let Some(price) = self.price {
            form.draft.price = Some(price);
        }
        if let Some(pinned) = self.pinned {
            form.draft.pinned = pinned;
        }
        if let Some(approved) = self.approved {
            form.draft.approved = approved;
        }

        let mut removals = self.remove_images;
        removals.sort_unstable_by(|a, b| b.cmp(a));
        removals.dedup();
        for index in removals {
            form.images.remove(index)?;
        }
        if !self.images.is_empty() {
            form.images.add_files(self.images)?;
        }
        for pair in &self.moves {
            let (from, to) = parse_move(pair)?;
            if !form.images.reorder(from, to) {
                warn!("Ignoring image move {}", pair);
            }
        }
        Ok(())
    }
}

fn parse_move(pair: &str) -> Result<(usize, usize)> {
    let (from, to) = pair
        .split_once(':')
        .with_context(|| format!("Expected `from:to`, got `{}`", pair))?;
    Ok((
        from.trim().parse().with_context(|| format!("Bad position in `{}`", pair))?,
        to.trim().parse().with_context(|| format!("Bad position in `{}`", pair))?,
    ))
}

struct App {
    config: Config,
    client: Arc<ApiClient>,
}

impl App {
    fn properties(&self) -> Arc<dyn PropertyBackend> {
        self.client.clone()
    }

    fn users(&self) -> Arc<dyn UserBackend> {
        self.client.clone()
    }

    fn catalog(&self) -> PropertyCatalog {
        let cache = CacheStore::new(&self.config.cache.dir, self.config.cache.ttl());
        PropertyCatalog::new(self.properties(), cache)
    }

    async fn session(&self) -> Session {
        Session::restore(self.users(), self.config.cache.session_path()).await
    }

    fn listing_url(&self, id: i64) -> String {
        format!("/propiedades/{}", id)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.base_url.clone() {
        config.api.base_url = url;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let client = Arc::new(ApiClient::new(&config.api)?);
    info!("🏠 Rocha Listings - {}", client.base_url());

    let app = App { config, client };
    run(&app, cli.command).await
}

async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Search(args) => {
            let filters = args.into_filters()?;
            let mut catalog = app.catalog();
            catalog.fetch().await;
            let results = search::apply(catalog.all(), &filters);

            info!("🔎 {} of {} listings match", results.len(), catalog.all().len());
            for (i, property) in results.iter().enumerate() {
                print_listing(i, property);
            }
        }
        Command::Show { id } => {
            let mut catalog = app.catalog();
            catalog.fetch().await;
            match catalog.find(id).await? {
                Some(property) => print_detail(app, &property),
                None => bail!("Propiedad {} no encontrada", id),
            }
        }
        Command::Home => {
            let mut catalog = app.catalog();
            catalog.fetch().await;
            let home = catalog.home();
            if home.is_empty() {
                warn!("Homepage selection is empty");
            }
            for (title, list) in [
                ("Destacadas", &home.pinned),
                ("Propiedades", &home.properties),
                ("Terrenos", &home.land),
            ] {
                println!("== {} ({}) ==", title, list.len());
                for (i, property) in list.iter().enumerate() {
                    print_listing(i, property);
                }
            }
        }
        Command::Refresh => {
            let mut catalog = app.catalog();
            catalog.invalidate().await;
            catalog.reload().await;
            info!(
                "💾 Cached {} listings in {}",
                catalog.all().len(),
                app.config.cache.dir.display()
            );
        }
        Command::Watch => {
            let catalog = Arc::new(Mutex::new(app.catalog()));
            {
                let mut guard = catalog.lock().await;
                if !guard.ensure_loaded(Duration::from_secs(2), 5).await {
                    warn!("Catalog still empty, the refresh timer will keep trying");
                }
            }
            let every = app.config.cache.refresh_interval();
            let handle = spawn_refresh(catalog.clone(), every);
            info!("⏱️  Refreshing every {} minutes, Ctrl-C to stop", every.as_secs() / 60);
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
            handle.stop();
            info!("Stopped");
        }
        Command::Login { email, password } => {
            let mut session = app.session().await;
            let user = session.login(&email, &password).await?;
            println!("Bienvenido, {}", user.full_name());
        }
        Command::Register(args) => {
            let mut session = app.session().await;
            let user = session
                .register(&RegisterUser {
                    first_name: args.first_name,
                    last_name: args.last_name,
                    email: args.email,
                    password: args.password,
                    phone: args.phone,
                })
                .await?;
            println!("Cuenta creada para {}", user.email);
        }
        Command::Logout => {
            app.session().await.logout().await;
        }
        Command::ForgotPassword { email } => {
            app.session().await.forgot_password(&email).await?;
            println!("Si el correo existe, recibirás un enlace para restablecer la contraseña.");
        }
        Command::ResetPassword {
            token,
            password,
            confirm,
        } => {
            let mut session = app.session().await;
            let user = session
                .reset_password(token.as_deref(), &password, &confirm)
                .await?;
            println!("Contraseña actualizada, sesión iniciada como {}", user.email);
        }
        Command::Profile(profile) => run_profile(app, profile.command).await?,
        Command::Contact(args) => {
            let form = ContactForm {
                name: args.name,
                email: args.email,
                subject: args.subject,
                message: args.message,
            };
            validation::validate_contact(&form)?;
            println!("Mensaje listo para enviar.");
            println!(
                "{}",
                validation::whatsapp_link(&app.config.site.whatsapp_phone, &app.config.site.url, "/contacto")
            );
        }
        Command::Admin(admin) => run_admin(app, admin.command).await?,
    }
    Ok(())
}

async fn run_profile(app: &App, command: ProfileSubcommand) -> Result<()> {
    let mut session = app.session().await;
    match command {
        ProfileSubcommand::Show => match session.fetch_profile().await? {
            Some(user) => {
                println!("{}", user.full_name());
                println!("   Email: {}", user.email);
                println!("   Teléfono: {}", user.phone);
                if user.admin {
                    println!("   Administrador");
                }
            }
            None => bail!("No hay una sesión activa"),
        },
        ProfileSubcommand::Update {
            first_name,
            last_name,
            email,
            phone,
        } => {
            let current = session.user().context("No hay una sesión activa")?;
            let mut update = UserUpdate::from(current);
            if let Some(v) = first_name {
                update.first_name = v;
            }
            if let Some(v) = last_name {
                update.last_name = v;
            }
            if let Some(v) = email {
                update.email = v;
            }
            if let Some(v) = phone {
                update.phone = v;
            }
            let user = session.update_profile(&update).await?;
            println!("Perfil actualizado: {}", user.full_name());
        }
        ProfileSubcommand::Password {
            current,
            new,
            confirm,
        } => {
            session
                .change_password(&ChangePassword {
                    current_password: current,
                    new_password: new,
                    confirm_password: confirm,
                })
                .await?;
            println!("Contraseña actualizada");
        }
    }
    Ok(())
}

async fn run_admin(app: &App, command: AdminSubcommand) -> Result<()> {
    let mut session = app.session().await;
    let token = session.require_token()?.to_string();
    let backend = app.properties();
    let mut catalog = app.catalog();

    match command {
        AdminSubcommand::Create(edit) => {
            let mut form = PropertyForm::new();
            edit.apply(&mut form).await?;
            let result = form.submit_create(backend.as_ref(), Some(&token)).await;
            let created = settle(&mut session, result).await?;
            catalog.fetch().await;
            catalog.replace(created.clone()).await;
            println!("✅ Propiedad {} creada", created.id);
        }
        AdminSubcommand::Update { id, edit } => {
            catalog.fetch().await;
            let existing = catalog
                .find(id)
                .await?
                .with_context(|| format!("Propiedad {} no encontrada", id))?;
            let mut form = PropertyForm::for_update(&existing);
            edit.apply(&mut form).await?;
            let result = form.submit_update(backend.as_ref(), Some(&token)).await;
            let updated = settle(&mut session, result).await?;
            catalog.replace(updated.clone()).await;
            println!("✅ Propiedad {} actualizada", updated.id);
        }
        AdminSubcommand::Delete { id } => {
            let result = backend.delete(id, &token).await;
            if session.guard(result).await? {
                catalog.fetch().await;
                catalog.remove(id).await;
                println!("🗑️  Propiedad {} eliminada", id);
            } else {
                bail!("No se pudo eliminar la propiedad {}", id);
            }
        }
    }
    Ok(())
}

/// A rejected token ends the session before the error is reported
async fn settle(session: &mut Session, result: Result<Property, FormError>) -> Result<Property> {
    match result {
        Ok(property) => Ok(property),
        Err(FormError::Api(e)) => {
            session.on_api_error(&e).await;
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_listing(i: usize, property: &Property) {
    println!("{}. {} ({})", i + 1, property.title, property.formatted_price());
    println!(
        "   {} en {}, {} m² de terreno",
        property.property_type.label(),
        property.neighborhood.label(),
        property.lot_size
    );
    if let (Some(rooms), Some(baths)) = (property.rooms, property.bathrooms) {
        println!("   {} dormitorios, {} baños", rooms, baths);
    }
    println!("   ID: {}", property.id);
    println!();
}

fn print_detail(app: &App, property: &Property) {
    print_listing(0, property);
    let statuses: Vec<&str> = property.status.iter().map(|s| s.label()).collect();
    println!("   Estado: {}", statuses.join(", "));
    if !property.address.is_empty() {
        println!("   Dirección: {}", property.address);
    }
    if let Some(area) = property.area {
        println!("   Superficie construida: {} m²", area);
    }
    println!("   {}", property.short_description);
    match property.feature_groups() {
        Ok(groups) => {
            for group in groups {
                println!("   {}:", group.title);
                for item in group.values {
                    println!("     - {}: {}", item.title, item.value);
                }
            }
        }
        Err(e) => warn!("Unreadable features for {}: {}", property.id, e),
    }
    for url in &property.image_src {
        println!("   Imagen: {}", url);
    }
    println!(
        "   WhatsApp: {}",
        validation::whatsapp_link(
            &app.config.site.whatsapp_phone,
            &app.config.site.url,
            &app.listing_url(property.id)
        )
    );
}
