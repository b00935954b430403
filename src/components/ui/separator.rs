use leptos::prelude::*;
use tw_merge::*;

#[component]
pub fn Separator(
    #[prop(optional)] orientation: SeparatorOrientation,
    #[prop(into, optional)] class: String,
) -> impl IntoView {
    let separator = SeparatorClass { orientation };
    let merged_class = separator.with_class(class);

    view! { <div class=merged_class role="separator" /> }
}

#[derive(TwClass, Default)]
#[tw(class = "shrink-0 bg-border")]
pub struct SeparatorClass {
    orientation: SeparatorOrientation,
}

#[derive(TwVariant)]
pub enum SeparatorOrientation {
    #[tw(default, class = "w-full h-[1px]")]
    Horizontal,
    #[tw(class = "h-full w-[1px]")]
    Vertical,
}
